use glam::DVec3;

use super::{Point3D, Trace};

/// Axis-aligned box and bounding sphere of a trace's present points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceBounds {
    /// Component-wise minimum.
    pub min: DVec3,
    /// Component-wise maximum.
    pub max: DVec3,
    /// Sphere center (the box center).
    pub center: DVec3,
    /// Largest distance from `center` to a present point.
    pub radius: f64,
}

impl TraceBounds {
    /// Bounds of the present points in `points`, or `None` when every
    /// point is missing.
    #[must_use]
    pub fn of_points(points: &[Point3D]) -> Option<Self> {
        let mut present = points.iter().filter(|p| p.is_present());
        let first = present.next()?.position();
        let (min, max) = present.fold((first, first), |(lo, hi), p| {
            let v = p.position();
            (lo.min(v), hi.max(v))
        });

        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .filter(|p| p.is_present())
            .map(|p| p.position().distance(center))
            .fold(0.0, f64::max);

        Some(Self {
            min,
            max,
            center,
            radius,
        })
    }
}

/// Contact threshold suggested for a trace: half its bounding radius,
/// rounded down. `None` when the trace has no present point.
#[must_use]
pub fn estimate_distance_threshold(trace: &Trace) -> Option<f64> {
    trace.bounds().map(|b| (2.0 * b.radius / 4.0).floor())
}
