use web_time::Instant;

use super::{resolve_side, ComputeEngine, EngineKind};
use crate::error::LiveMapError;
use crate::matrix::{
    compute_ensemble_average_distances, compute_trace_distances,
};
use crate::options::Options;
use crate::transport::{ComputeRequest, ComputeResponse, Mode};

/// Computes the distance matrix of a trace, or the ensemble average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceMatrixEngine {
    max_side: u32,
}

impl DistanceMatrixEngine {
    /// Engine configured from `options`.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            max_side: options.matrix.max_side,
        }
    }
}

impl Default for DistanceMatrixEngine {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl ComputeEngine for DistanceMatrixEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Distance
    }

    fn execute(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, LiveMapError> {
        let side = resolve_side(
            self.kind(),
            request.trace_length,
            request.maximum_segment_id,
            self.max_side,
        )?;
        let traces = request.traces()?;

        let start = Instant::now();
        let (matrix, max_distance) = match (request.mode, traces) {
            (Mode::Trace, [trace]) => compute_trace_distances(trace, side)?,
            _ => compute_ensemble_average_distances(traces, side)?,
        };
        log::info!(
            "distance matrix ({:?}): {} trace(s), side {side} in {:.1}ms",
            request.mode,
            traces.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ComputeResponse {
            mode: request.mode,
            matrix_buffer: matrix.into_buffer(),
            max_distance,
        })
    }
}
