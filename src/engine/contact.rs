use web_time::Instant;

use super::{resolve_side, ComputeEngine, EngineKind};
use crate::error::LiveMapError;
use crate::matrix::compute_contact_frequency_with_node_size;
use crate::options::{ContactOptions, Options};
use crate::trace::{estimate_distance_threshold, Trace};
use crate::transport::{ComputeRequest, ComputeResponse};

/// Counts segment contacts for a trace or an ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactFrequencyEngine {
    node_size: u32,
    max_side: u32,
    contact: ContactOptions,
}

impl ContactFrequencyEngine {
    /// Engine configured from `options`.
    #[must_use]
    pub fn new(options: &Options) -> Self {
        Self {
            node_size: options.index.node_size,
            max_side: options.matrix.max_side,
            contact: options.contact.clone(),
        }
    }

    /// Threshold to use for `request`: the request's own value, otherwise
    /// an estimate from the first trace, otherwise the configured default.
    fn resolve_threshold(
        &self,
        request: &ComputeRequest,
        traces: &[Trace],
    ) -> Result<f64, LiveMapError> {
        if let Some(threshold) = request.distance_threshold {
            if !threshold.is_finite() {
                return Err(LiveMapError::Transport(format!(
                    "distance threshold {threshold} is not finite"
                )));
            }
            return Ok(threshold);
        }

        if !self.contact.estimate_threshold {
            return Ok(self.contact.default_distance_threshold);
        }

        match traces.first().and_then(estimate_distance_threshold) {
            Some(estimate) => {
                let threshold = self.contact.clamp_threshold(estimate);
                log::debug!("estimated contact threshold {threshold}");
                Ok(threshold)
            }
            None => {
                log::warn!(
                    "no present points to estimate a threshold from, using {}",
                    self.contact.default_distance_threshold
                );
                Ok(self.contact.default_distance_threshold)
            }
        }
    }
}

impl Default for ContactFrequencyEngine {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl ComputeEngine for ContactFrequencyEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::ContactFrequency
    }

    fn execute(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputeResponse, LiveMapError> {
        let side = resolve_side(
            self.kind(),
            request.maximum_segment_id,
            request.trace_length,
            self.max_side,
        )?;
        let traces = request.traces()?;
        let threshold = self.resolve_threshold(request, traces)?;

        let start = Instant::now();
        let matrix = compute_contact_frequency_with_node_size(
            traces,
            side,
            threshold,
            self.node_size,
        )?;
        log::info!(
            "contact frequency: {} trace(s), side {side}, \
             threshold {threshold} in {:.1}ms",
            traces.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ComputeResponse {
            mode: request.mode,
            matrix_buffer: matrix.into_buffer(),
            max_distance: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ContactMatrix;
    use crate::trace::Point3D;

    fn line_trace() -> Trace {
        Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(10.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn explicit_threshold_is_used_verbatim() {
        let engine = ContactFrequencyEngine::default();
        let request = ComputeRequest::contact_trace(line_trace(), 3, Some(2.0));
        let response = engine.execute(&request).unwrap();
        let m = ContactMatrix::from_buffer(&response.matrix_buffer).unwrap();
        assert_eq!(m.cells(), &[1, 1, 0, 1, 1, 0, 0, 0, 1]);
        assert_eq!(response.max_distance, None);
    }

    #[test]
    fn missing_threshold_is_estimated_from_the_first_trace() {
        // radius 5 around x = 5 -> threshold floor(2 * 5 / 4) = 2
        let engine = ContactFrequencyEngine::default();
        let request = ComputeRequest::contact_trace(line_trace(), 3, None);
        assert_eq!(
            engine
                .resolve_threshold(&request, request.traces().unwrap())
                .unwrap(),
            2.0
        );
    }

    #[test]
    fn estimation_can_be_disabled() {
        let mut options = Options::default();
        options.contact.estimate_threshold = false;
        options.contact.default_distance_threshold = 0.5;
        let engine = ContactFrequencyEngine::new(&options);
        let request = ComputeRequest::contact_trace(line_trace(), 3, None);
        assert_eq!(
            engine
                .resolve_threshold(&request, request.traces().unwrap())
                .unwrap(),
            0.5
        );
    }

    #[test]
    fn all_missing_trace_falls_back_to_the_default() {
        let engine = ContactFrequencyEngine::default();
        let trace = Trace::new(vec![Point3D::missing(); 2]);
        let request = ComputeRequest::contact_trace(trace, 2, None);
        assert_eq!(
            engine
                .resolve_threshold(&request, request.traces().unwrap())
                .unwrap(),
            256.0
        );
    }

    #[test]
    fn non_finite_threshold_is_rejected() {
        let engine = ContactFrequencyEngine::default();
        let request =
            ComputeRequest::contact_trace(line_trace(), 3, Some(f64::INFINITY));
        assert!(matches!(
            engine.execute(&request),
            Err(LiveMapError::Transport(_))
        ));
    }

    #[test]
    fn side_falls_back_to_trace_length() {
        let engine = ContactFrequencyEngine::default();
        let mut request =
            ComputeRequest::contact_trace(line_trace(), 3, Some(2.0));
        request.maximum_segment_id = None;
        request.trace_length = Some(4);
        let response = engine.execute(&request).unwrap();
        assert_eq!(response.matrix_buffer.side(), Some(4));
    }

    #[test]
    fn side_above_the_configured_limit_is_refused() {
        let mut options = Options::default();
        options.matrix.max_side = 3;
        let engine = ContactFrequencyEngine::new(&options);
        let request =
            ComputeRequest::contact_trace(line_trace(), 4, Some(2.0));
        assert!(matches!(
            engine.execute(&request),
            Err(LiveMapError::Transport(_))
        ));
    }
}
