use serde::{Deserialize, Serialize};

use crate::error::LiveMapError;
use crate::matrix::MatrixBuffer;
use crate::trace::Trace;

/// Whether a request covers one trace or a whole ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// A single trace.
    Trace,
    /// Every trace of an ensemble.
    Ensemble,
}

/// Caller-to-worker message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeRequest {
    /// Single trace or ensemble.
    pub mode: Mode,
    /// Matrix side for the contact-frequency engine.
    #[serde(
        rename = "maximumSegmentID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum_segment_id: Option<u32>,
    /// Matrix side for the distance engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_length: Option<u32>,
    /// Contact threshold; estimated by the engine when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_threshold: Option<f64>,
    /// Payload for [`Mode::Trace`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Trace>,
    /// Payload for [`Mode::Ensemble`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemble: Option<Vec<Trace>>,
}

impl ComputeRequest {
    /// Contact frequencies of a single trace.
    #[must_use]
    pub fn contact_trace(
        trace: Trace,
        maximum_segment_id: u32,
        distance_threshold: Option<f64>,
    ) -> Self {
        Self {
            mode: Mode::Trace,
            maximum_segment_id: Some(maximum_segment_id),
            trace_length: None,
            distance_threshold,
            trace: Some(trace),
            ensemble: None,
        }
    }

    /// Contact frequencies accumulated over an ensemble.
    #[must_use]
    pub fn contact_ensemble(
        ensemble: Vec<Trace>,
        maximum_segment_id: u32,
        distance_threshold: Option<f64>,
    ) -> Self {
        Self {
            mode: Mode::Ensemble,
            maximum_segment_id: Some(maximum_segment_id),
            trace_length: None,
            distance_threshold,
            trace: None,
            ensemble: Some(ensemble),
        }
    }

    /// Pairwise distances of a single trace.
    #[must_use]
    pub fn distance_trace(trace: Trace, trace_length: u32) -> Self {
        Self {
            mode: Mode::Trace,
            maximum_segment_id: None,
            trace_length: Some(trace_length),
            distance_threshold: None,
            trace: Some(trace),
            ensemble: None,
        }
    }

    /// Ensemble-averaged pairwise distances.
    #[must_use]
    pub fn distance_ensemble(ensemble: Vec<Trace>, trace_length: u32) -> Self {
        Self {
            mode: Mode::Ensemble,
            maximum_segment_id: None,
            trace_length: Some(trace_length),
            distance_threshold: None,
            trace: None,
            ensemble: Some(ensemble),
        }
    }

    /// Reject values the JSON wire form would silently turn into `null`.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Transport`] for a non-finite `distance_threshold`,
    /// [`LiveMapError::Construction`] for a present point with a
    /// non-finite coordinate, the same errors an engine reports for them.
    pub fn check_encodable(&self) -> Result<(), LiveMapError> {
        let threshold = self.distance_threshold;
        if let Some(t) = threshold.filter(|t| !t.is_finite()) {
            return Err(LiveMapError::Transport(format!(
                "distance threshold {t} is not finite"
            )));
        }
        let ensemble = self.ensemble.iter().flatten();
        for trace in self.trace.iter().chain(ensemble) {
            trace.validate(u32::MAX)?;
        }
        Ok(())
    }

    /// The traces the request's mode refers to.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Transport`] if the payload for the mode is absent or
    /// the ensemble is empty.
    pub fn traces(&self) -> Result<&[Trace], LiveMapError> {
        match (self.mode, &self.trace, &self.ensemble) {
            (Mode::Trace, Some(trace), _) => Ok(std::slice::from_ref(trace)),
            (Mode::Ensemble, _, Some(ensemble)) if !ensemble.is_empty() => {
                Ok(ensemble)
            }
            (Mode::Ensemble, _, Some(_)) => Err(LiveMapError::Transport(
                "ensemble request carries no traces".to_owned(),
            )),
            (Mode::Trace, None, _) => Err(LiveMapError::Transport(
                "trace request carries no trace".to_owned(),
            )),
            (Mode::Ensemble, _, None) => Err(LiveMapError::Transport(
                "ensemble request carries no ensemble".to_owned(),
            )),
        }
    }
}

/// Worker-to-caller message.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeResponse {
    /// Mode of the request this answers.
    pub mode: Mode,
    /// Flattened contact or distance matrix.
    pub matrix_buffer: MatrixBuffer,
    /// Largest distance (distance engine only).
    #[serde(default)]
    pub max_distance: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Point3D;

    #[test]
    fn wire_keys_follow_the_protocol() {
        let request = ComputeRequest::contact_trace(
            Trace::new(vec![Point3D::new(0.0, 0.0, 0.0)]),
            1,
            Some(2.0),
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["mode"], "trace");
        assert_eq!(value["maximumSegmentID"], 1);
        assert_eq!(value["distanceThreshold"], 2.0);
        assert!(value.get("traceLength").is_none());
        assert!(value.get("ensemble").is_none());
        assert_eq!(value["trace"][0]["isMissingData"], false);
    }

    #[test]
    fn traces_follow_the_mode() {
        let trace = Trace::new(vec![Point3D::new(0.0, 0.0, 0.0)]);
        let single = ComputeRequest::distance_trace(trace.clone(), 1);
        assert_eq!(single.traces().unwrap().len(), 1);

        let many = ComputeRequest::distance_ensemble(vec![trace.clone(); 3], 1);
        assert_eq!(many.traces().unwrap().len(), 3);

        let empty = ComputeRequest::distance_ensemble(Vec::new(), 1);
        assert!(matches!(empty.traces(), Err(LiveMapError::Transport(_))));

        let mut mismatched = ComputeRequest::distance_trace(trace, 1);
        mismatched.mode = Mode::Ensemble;
        assert!(matches!(
            mismatched.traces(),
            Err(LiveMapError::Transport(_))
        ));
    }

    #[test]
    fn values_json_cannot_carry_are_rejected() {
        let trace = Trace::new(vec![Point3D::new(0.0, 0.0, 0.0)]);
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let request =
                ComputeRequest::contact_trace(trace.clone(), 1, Some(bad));
            assert!(matches!(
                request.check_encodable(),
                Err(LiveMapError::Transport(_))
            ));
        }

        let smeared = Trace::new(vec![
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(f64::INFINITY, 0.0, 0.0),
        ]);
        let request =
            ComputeRequest::distance_ensemble(vec![trace, smeared], 2);
        assert!(matches!(
            request.check_encodable(),
            Err(LiveMapError::Construction(_))
        ));
    }

    #[test]
    fn missing_points_and_absent_threshold_are_encodable() {
        let trace =
            Trace::new(vec![Point3D::new(1.0, 2.0, 3.0), Point3D::missing()]);
        assert!(ComputeRequest::contact_trace(trace.clone(), 2, None)
            .check_encodable()
            .is_ok());
        assert!(ComputeRequest::distance_trace(trace, 2)
            .check_encodable()
            .is_ok());
    }

    #[test]
    fn response_serializes_missing_max_as_null() {
        let response = ComputeResponse {
            mode: Mode::Ensemble,
            matrix_buffer: MatrixBuffer::new(vec![1.0]),
            max_distance: None,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["mode"], "ensemble");
        assert_eq!(value["matrixBuffer"], serde_json::json!([1.0]));
        assert!(value["maxDistance"].is_null());
    }
}
