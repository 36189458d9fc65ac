//! Point traces: one 3D point per genomic segment.
//!
//! A [`Trace`] is indexed by segment id. Segments without a reliable
//! position stay in the trace as missing points so that slot `i` always
//! means segment `i`, across every trace of an ensemble.

mod bounds;

pub use bounds::{estimate_distance_threshold, TraceBounds};
use glam::DVec3;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LiveMapError;

/// A single trace sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point3D {
    /// X coordinate.
    #[serde(default = "missing_coordinate", deserialize_with = "nullable")]
    pub x: f64,
    /// Y coordinate.
    #[serde(default = "missing_coordinate", deserialize_with = "nullable")]
    pub y: f64,
    /// Z coordinate.
    #[serde(default = "missing_coordinate", deserialize_with = "nullable")]
    pub z: f64,
    /// The segment was not observed; coordinates are placeholders.
    #[serde(default, deserialize_with = "nullable_flag")]
    pub is_missing_data: bool,
}

fn missing_coordinate() -> f64 {
    f64::NAN
}

fn nullable<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
}

fn nullable_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

impl Point3D {
    /// A present point.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            is_missing_data: false,
        }
    }

    /// A missing point holding placeholder coordinates.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
            is_missing_data: true,
        }
    }

    /// Position as a vector.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.position().distance(other.position())
    }

    /// Whether the point takes part in spatial queries and distances.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !self.is_missing_data
    }
}

/// An ordered sequence of points indexed by segment id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    points: Vec<Point3D>,
}

impl Trace {
    /// Wrap a list of points; slot `i` is segment `i`.
    #[must_use]
    pub fn new(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    /// Build a trace from a flat `[x0, y0, z0, x1, ...]` list. A triple
    /// containing NaN marks its segment missing. Missing slots carry the
    /// centroid of the present points' bounding box.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Construction`] if the length is not a multiple of 3.
    pub fn from_flat_xyz(coords: &[f64]) -> Result<Self, LiveMapError> {
        if coords.len() % 3 != 0 {
            return Err(LiveMapError::Construction(format!(
                "flat coordinate list of length {} is not a list of triples",
                coords.len()
            )));
        }

        let mut points: Vec<Point3D> = coords
            .chunks_exact(3)
            .map(|c| {
                if c.iter().any(|v| v.is_nan()) {
                    Point3D::missing()
                } else {
                    Point3D::new(c[0], c[1], c[2])
                }
            })
            .collect();

        let centroid = TraceBounds::of_points(&points)
            .map_or(DVec3::ZERO, |b| (b.min + b.max) * 0.5);
        for p in points.iter_mut().filter(|p| p.is_missing_data) {
            p.x = centroid.x;
            p.y = centroid.y;
            p.z = centroid.z;
        }

        Ok(Self { points })
    }

    /// All slots, missing ones included.
    #[must_use]
    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the trace has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Present points paired with their segment ids, in slot order.
    pub fn present(&self) -> impl Iterator<Item = (u32, &Point3D)> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_present())
            .map(|(i, p)| (i as u32, p))
    }

    /// Number of present points.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_present()).count()
    }

    /// Bounding box and sphere of the present points.
    #[must_use]
    pub fn bounds(&self) -> Option<TraceBounds> {
        TraceBounds::of_points(&self.points)
    }

    /// Check that every slot fits in a matrix of side `maximum_segment_id`
    /// and that present points have finite coordinates.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Bounds`] for a trace longer than the matrix side,
    /// [`LiveMapError::Construction`] for a non-finite present point.
    pub fn validate(
        &self,
        maximum_segment_id: u32,
    ) -> Result<(), LiveMapError> {
        if self.points.len() > maximum_segment_id as usize {
            return Err(LiveMapError::Bounds {
                segment_id: u32::try_from(self.points.len() - 1)
                    .unwrap_or(u32::MAX),
                maximum_segment_id,
            });
        }
        if let Some((segment_id, _)) =
            self.present().find(|(_, p)| !p.position().is_finite())
        {
            return Err(LiveMapError::Construction(format!(
                "segment {segment_id} has non-finite coordinates"
            )));
        }
        Ok(())
    }
}

impl From<Vec<Point3D>> for Trace {
    fn from(points: Vec<Point3D>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point3D> for Trace {
    fn from_iter<I: IntoIterator<Item = Point3D>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
