//! Static 3D k-d tree over a flat point array.
//!
//! The tree has no node objects. Construction permutes two parallel
//! arrays (ids and interleaved xyz coordinates) so that, for every range
//! `[left, right)` longer than the leaf size, the median slot
//! `left + (right - left) / 2` splits the range on the current axis:
//! slots before it are `<=` and slots after it are `>=` on that axis.
//! Axes cycle x, y, z with depth. Queries replay the same recursion with
//! an explicit stack.

mod query;
mod sort;

use glam::DVec3;

use crate::error::LiveMapError;
use crate::trace::Trace;

/// Number of coordinates stored per point.
const DIMS: usize = 3;

/// Slot of the splitting point for the half-open range `[left, right)`.
#[inline]
const fn median(left: usize, right: usize) -> usize {
    left + (right - left) / 2
}

/// Radius and box queries over a fixed set of points with opaque ids.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    ids: Vec<u32>,
    coords: Vec<f64>,
    node_size: usize,
}

impl SpatialIndex {
    /// Index `points`, tagging them with `ids` (or `0..points.len()` when
    /// `None`). Partitions of at most `node_size` points become leaves.
    ///
    /// The caller filters out missing data; every point given here is
    /// indexed.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Construction`] if `ids` and `points` differ in
    /// length, `node_size` is zero, or a coordinate is not finite.
    pub fn build(
        points: &[DVec3],
        ids: Option<&[u32]>,
        node_size: u32,
    ) -> Result<Self, LiveMapError> {
        let ids = match ids {
            Some(ids) if ids.len() != points.len() => {
                return Err(LiveMapError::Construction(format!(
                    "{} ids supplied for {} points",
                    ids.len(),
                    points.len()
                )));
            }
            Some(ids) => ids.to_vec(),
            None => {
                let count = u32::try_from(points.len()).map_err(|_| {
                    LiveMapError::Construction(format!(
                        "{} points exceed the u32 id space",
                        points.len()
                    ))
                })?;
                (0..count).collect()
            }
        };
        Self::from_owned(ids, points, node_size)
    }

    /// Index the present points of `trace`, using segment ids as point ids.
    ///
    /// # Errors
    ///
    /// See [`SpatialIndex::build`].
    pub fn from_trace(
        trace: &Trace,
        node_size: u32,
    ) -> Result<Self, LiveMapError> {
        let (ids, points): (Vec<u32>, Vec<DVec3>) =
            trace.present().map(|(id, p)| (id, p.position())).unzip();
        Self::from_owned(ids, &points, node_size)
    }

    fn from_owned(
        mut ids: Vec<u32>,
        points: &[DVec3],
        node_size: u32,
    ) -> Result<Self, LiveMapError> {
        if node_size == 0 {
            return Err(LiveMapError::Construction(
                "node size must be at least 1".to_owned(),
            ));
        }
        if let Some(slot) = points.iter().position(|p| !p.is_finite()) {
            return Err(LiveMapError::Construction(format!(
                "point {slot} has non-finite coordinates"
            )));
        }

        let mut coords = Vec::with_capacity(points.len() * DIMS);
        for p in points {
            coords.extend_from_slice(&[p.x, p.y, p.z]);
        }

        let node_size = node_size as usize;
        sort::sort_kd(&mut ids, &mut coords, node_size, 0, points.len(), 0);

        Ok(Self {
            ids,
            coords,
            node_size,
        })
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Leaf size the index was built with.
    #[must_use]
    pub fn node_size(&self) -> usize {
        self.node_size
    }

    /// Ids in tree order.
    #[must_use]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Position stored at tree slot `slot`.
    #[must_use]
    pub fn position(&self, slot: usize) -> DVec3 {
        let c = &self.coords[slot * DIMS..slot * DIMS + DIMS];
        DVec3::new(c[0], c[1], c[2])
    }

    #[inline]
    fn coord(&self, slot: usize, axis: usize) -> f64 {
        self.coords[slot * DIMS + axis]
    }
}
