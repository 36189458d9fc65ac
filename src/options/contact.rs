use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Contact-frequency engine options.
pub struct ContactOptions {
    /// Threshold used when a request carries none and no estimate is
    /// available.
    pub default_distance_threshold: f64,
    /// Upper bound for user-entered and estimated thresholds.
    pub max_distance_threshold: f64,
    /// Estimate a threshold from the first trace's bounding sphere when a
    /// request carries none.
    pub estimate_threshold: bool,
}

impl Default for ContactOptions {
    fn default() -> Self {
        Self {
            default_distance_threshold: 256.0,
            max_distance_threshold: 1e4,
            estimate_threshold: true,
        }
    }
}

impl ContactOptions {
    /// Clamp a threshold to `[0, max_distance_threshold]`. NaN maps to the
    /// default threshold.
    #[must_use]
    pub fn clamp_threshold(&self, threshold: f64) -> f64 {
        if threshold.is_nan() {
            return self.default_distance_threshold;
        }
        threshold.clamp(0.0, self.max_distance_threshold.max(0.0))
    }
}
