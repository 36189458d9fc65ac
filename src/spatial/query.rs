use glam::DVec3;

use super::{median, SpatialIndex, DIMS};

impl SpatialIndex {
    /// Ids of all points at Euclidean distance `<= radius` from `center`.
    ///
    /// Order is unspecified. A negative or NaN radius matches nothing.
    #[must_use]
    pub fn within(&self, center: DVec3, radius: f64) -> Vec<u32> {
        let mut result = Vec::new();
        if self.is_empty() || radius.is_nan() || radius < 0.0 {
            return result;
        }

        let q = center.to_array();
        let r2 = radius * radius;
        let mut stack = vec![(0, self.len(), 0)];

        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= self.node_size {
                for slot in left..right {
                    if self.position(slot).distance_squared(center) <= r2 {
                        result.push(self.ids[slot]);
                    }
                }
                continue;
            }

            let m = median(left, right);
            if self.position(m).distance_squared(center) <= r2 {
                result.push(self.ids[m]);
            }

            let split = self.coord(m, axis);
            let next = (axis + 1) % DIMS;
            if q[axis] - radius <= split {
                stack.push((left, m, next));
            }
            if q[axis] + radius >= split {
                stack.push((m + 1, right, next));
            }
        }

        result
    }

    /// Ids of all points inside the axis-aligned box `[min, max]`
    /// (bounds inclusive). Order is unspecified.
    #[must_use]
    pub fn range(&self, min: DVec3, max: DVec3) -> Vec<u32> {
        let mut result = Vec::new();
        if self.is_empty() {
            return result;
        }

        let (lo, hi) = (min.to_array(), max.to_array());
        let inside = |p: DVec3| p.cmpge(min).all() && p.cmple(max).all();
        let mut stack = vec![(0, self.len(), 0)];

        while let Some((left, right, axis)) = stack.pop() {
            if right - left <= self.node_size {
                for slot in left..right {
                    if inside(self.position(slot)) {
                        result.push(self.ids[slot]);
                    }
                }
                continue;
            }

            let m = median(left, right);
            if inside(self.position(m)) {
                result.push(self.ids[m]);
            }

            let split = self.coord(m, axis);
            let next = (axis + 1) % DIMS;
            if lo[axis] <= split {
                stack.push((left, m, next));
            }
            if hi[axis] >= split {
                stack.push((m + 1, right, next));
            }
        }

        result
    }
}
