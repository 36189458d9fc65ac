//! Compute engines executed by background workers.
//!
//! An engine turns one decoded [`ComputeRequest`] into a
//! [`ComputeResponse`]. Engines are stateless between requests; a
//! [`ComputeWorker`](crate::transport::ComputeWorker) owns one engine and
//! runs it on its own thread.

mod contact;
mod distance;

use std::fmt;

pub use contact::ContactFrequencyEngine;
pub use distance::DistanceMatrixEngine;

use crate::error::LiveMapError;
use crate::transport::{ComputeRequest, ComputeResponse};

/// Which data product an engine computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Contact-frequency counts.
    ContactFrequency,
    /// Pairwise (or ensemble-averaged) distances.
    Distance,
}

impl EngineKind {
    /// Name given to the worker thread running this kind of engine.
    #[must_use]
    pub fn thread_name(self) -> &'static str {
        match self {
            Self::ContactFrequency => "livemap-contact",
            Self::Distance => "livemap-distance",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContactFrequency => write!(f, "contact-frequency"),
            Self::Distance => write!(f, "distance"),
        }
    }
}

/// A request handler that can be moved onto a worker thread.
pub trait ComputeEngine: Send + 'static {
    /// The data product this engine computes.
    fn kind(&self) -> EngineKind;

    /// Run one request to completion.
    ///
    /// # Errors
    ///
    /// Any [`LiveMapError`] raised while reading the request or computing
    /// the matrix.
    fn execute(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, LiveMapError>;
}

/// Matrix side for a request, trying `primary` before `fallback`, refused
/// when it exceeds `max_side`.
fn resolve_side(
    kind: EngineKind,
    primary: Option<u32>,
    fallback: Option<u32>,
    max_side: u32,
) -> Result<u32, LiveMapError> {
    let side = primary.or(fallback).ok_or_else(|| {
        LiveMapError::Transport(format!(
            "{kind} request carries neither maximumSegmentID nor traceLength"
        ))
    })?;
    if side > max_side {
        return Err(LiveMapError::Transport(format!(
            "{kind} request asks for side {side}, limit is {max_side}"
        )));
    }
    Ok(side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_have_distinct_names() {
        assert_eq!(
            EngineKind::ContactFrequency.to_string(),
            "contact-frequency"
        );
        assert_eq!(EngineKind::Distance.to_string(), "distance");
        assert_ne!(
            EngineKind::ContactFrequency.thread_name(),
            EngineKind::Distance.thread_name()
        );
    }

    #[test]
    fn side_prefers_primary() {
        let kind = EngineKind::Distance;
        assert_eq!(resolve_side(kind, Some(3), Some(9), 16).unwrap(), 3);
        assert_eq!(resolve_side(kind, None, Some(9), 16).unwrap(), 9);
        assert!(matches!(
            resolve_side(kind, None, None, 16),
            Err(LiveMapError::Transport(_))
        ));
    }

    #[test]
    fn side_above_the_limit_is_refused() {
        let kind = EngineKind::ContactFrequency;
        assert_eq!(resolve_side(kind, Some(16), None, 16).unwrap(), 16);
        assert!(matches!(
            resolve_side(kind, Some(17), None, 16),
            Err(LiveMapError::Transport(_))
        ));
    }
}
