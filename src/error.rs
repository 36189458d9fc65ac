//! Crate-level error types.

use std::fmt;

use crate::engine::EngineKind;

/// Errors produced by the livemap crate.
#[derive(Debug)]
pub enum LiveMapError {
    /// Malformed input to spatial index construction (length mismatch,
    /// zero leaf size, non-finite coordinates on a present point).
    Construction(String),
    /// A trace slot addresses a segment outside the matrix.
    Bounds {
        /// Offending segment id (the slot index in its trace).
        segment_id: u32,
        /// Side length of the matrix being written.
        maximum_segment_id: u32,
    },
    /// Request/response encoding failure, malformed request, or a failure
    /// raised while the background worker executed the request.
    Transport(String),
    /// A worker already has a request in flight.
    Busy(EngineKind),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
}

impl fmt::Display for LiveMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction(msg) => {
                write!(f, "spatial index construction error: {msg}")
            }
            Self::Bounds {
                segment_id,
                maximum_segment_id,
            } => write!(
                f,
                "segment id {segment_id} out of bounds for matrix of side \
                 {maximum_segment_id}"
            ),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Busy(kind) => {
                write!(f, "{kind} worker already has a request in flight")
            }
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
        }
    }
}

impl std::error::Error for LiveMapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LiveMapError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LiveMapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
