//! JSON framing for requests and responses crossing a thread or process
//! boundary.

use super::{ComputeRequest, ComputeResponse};
use crate::error::LiveMapError;

/// Serialize a request to JSON bytes.
///
/// JSON has no infinities or NaN, so such values are rejected here rather
/// than written as `null` and read back as absent.
///
/// # Errors
///
/// As [`ComputeRequest::check_encodable`], or
/// [`LiveMapError::Transport`] if serialization fails.
pub fn encode_request(
    request: &ComputeRequest,
) -> Result<Vec<u8>, LiveMapError> {
    request.check_encodable()?;
    Ok(serde_json::to_vec(request)?)
}

/// Parse a request from JSON bytes.
///
/// # Errors
///
/// [`LiveMapError::Transport`] for malformed JSON or a missing `mode`.
pub fn decode_request(bytes: &[u8]) -> Result<ComputeRequest, LiveMapError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serialize a response to JSON bytes.
///
/// # Errors
///
/// [`LiveMapError::Transport`] if serialization fails.
pub fn encode_response(
    response: &ComputeResponse,
) -> Result<Vec<u8>, LiveMapError> {
    Ok(serde_json::to_vec(response)?)
}

/// Parse a response from JSON bytes.
///
/// # Errors
///
/// [`LiveMapError::Transport`] for malformed JSON.
pub fn decode_response(bytes: &[u8]) -> Result<ComputeResponse, LiveMapError> {
    Ok(serde_json::from_slice(bytes)?)
}
