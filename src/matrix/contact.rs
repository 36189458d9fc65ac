use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use rustc_hash::FxHashSet;

use super::{buffer_side, ContactMatrix, MatrixBuffer};
use crate::error::LiveMapError;
use crate::options::DEFAULT_NODE_SIZE;
use crate::spatial::SpatialIndex;
use crate::trace::Trace;

/// Count, over every trace, how often two segments lie within
/// `distance_threshold` of each other.
///
/// Cell `(i, j)` sums the traces in which both segments are present and no
/// farther apart than the threshold; the diagonal sums the traces in which
/// segment `i` is present. Counts are not normalized.
///
/// # Errors
///
/// [`LiveMapError::Bounds`] if a trace is longer than `maximum_segment_id`,
/// [`LiveMapError::Construction`] if a present point is not finite,
/// [`LiveMapError::Transport`] if the matrix cannot be allocated.
pub fn compute_contact_frequency(
    traces: &[Trace],
    maximum_segment_id: u32,
    distance_threshold: f64,
) -> Result<ContactMatrix, LiveMapError> {
    compute_contact_frequency_with_node_size(
        traces,
        maximum_segment_id,
        distance_threshold,
        DEFAULT_NODE_SIZE,
    )
}

/// [`compute_contact_frequency`] with an explicit spatial index leaf size.
///
/// Traces are accumulated in parallel; integer sums make the result
/// independent of scheduling. Each rayon split allocates its partial
/// matrix on first use.
///
/// # Errors
///
/// As [`compute_contact_frequency`], plus [`LiveMapError::Construction`]
/// for a zero `node_size`.
pub fn compute_contact_frequency_with_node_size(
    traces: &[Trace],
    maximum_segment_id: u32,
    distance_threshold: f64,
    node_size: u32,
) -> Result<ContactMatrix, LiveMapError> {
    for trace in traces {
        trace.validate(maximum_segment_id)?;
    }

    let side = maximum_segment_id as usize;
    let allocate = || ContactMatrix::try_filled(side, 0);
    let merged = traces
        .par_iter()
        .try_fold(
            || None,
            |acc: Option<ContactMatrix>, trace| -> Result<_, LiveMapError> {
                let mut matrix = acc.map_or_else(allocate, Ok)?;
                accumulate_trace(
                    &mut matrix,
                    trace,
                    distance_threshold,
                    node_size,
                )?;
                Ok(Some(matrix))
            },
        )
        .try_reduce(
            || None,
            |a, b| {
                Ok(match (a, b) {
                    (Some(mut a), Some(b)) => {
                        a.add_counts(&b);
                        Some(a)
                    }
                    (a, b) => a.or(b),
                })
            },
        )?;
    merged.map_or_else(allocate, Ok)
}

/// Add one trace's contacts to `matrix`. The trace must already be
/// validated against the matrix side.
fn accumulate_trace(
    matrix: &mut ContactMatrix,
    trace: &Trace,
    distance_threshold: f64,
    node_size: u32,
) -> Result<(), LiveMapError> {
    let index = SpatialIndex::from_trace(trace, node_size)?;
    let mut visited = FxHashSet::default();

    for (i, point) in trace.present() {
        matrix.increment(i as usize, i as usize);
        let _ = visited.insert(i);

        for j in index.within(point.position(), distance_threshold) {
            if !visited.contains(&j) {
                matrix.increment(i as usize, j as usize);
            }
        }
    }

    Ok(())
}

/// One upper-triangle cell of a contact matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRecord {
    /// Column (segment) index, `>= bin_y`.
    pub bin_x: u32,
    /// Row (segment) index.
    pub bin_y: u32,
    /// Contact count.
    pub count: u32,
}

/// Upper-triangle contact records and their mean count.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecordList {
    /// Records in row-major upper-triangle order, diagonal included.
    pub records: Vec<ContactRecord>,
    /// Mean count over `records`.
    pub average_count: f64,
}

impl ContactMatrix {
    /// Add one to `(i, j)` and its mirror.
    fn increment(&mut self, i: usize, j: usize) {
        let count = self.get(i, j) + 1;
        self.set_symmetric(i, j, count);
    }

    fn add_counts(&mut self, other: &Self) {
        for (a, b) in self.cells_mut().iter_mut().zip(other.cells()) {
            *a += *b;
        }
    }

    /// Largest count, or `None` when every cell is zero.
    #[must_use]
    pub fn max_count(&self) -> Option<u32> {
        self.cells().iter().copied().max().filter(|&m| m > 0)
    }

    /// Walk the upper triangle (diagonal included) and collect one record
    /// per cell, together with the running mean of their counts.
    #[must_use]
    pub fn contact_records(&self) -> ContactRecordList {
        let side = self.side();
        let mut records = Vec::with_capacity(side * (side + 1) / 2);
        let mut average_count = 0.0;

        for y in 0..side {
            for x in y..side {
                let count = self.get(x, y);
                records.push(ContactRecord {
                    bin_x: x as u32,
                    bin_y: y as u32,
                    count,
                });
                let n = records.len() as f64;
                average_count += (f64::from(count) - average_count) / n;
            }
        }

        ContactRecordList {
            records,
            average_count,
        }
    }

    /// Cell counts as a wire buffer.
    #[must_use]
    pub fn into_buffer(self) -> MatrixBuffer {
        MatrixBuffer::new(self.cells().iter().map(|&c| c as f32).collect())
    }

    /// Rebuild a contact matrix from a received buffer.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Transport`] if the buffer is not square or holds a
    /// negative or non-finite count.
    pub fn from_buffer(buffer: &MatrixBuffer) -> Result<Self, LiveMapError> {
        let side = buffer_side(buffer)?;
        let cells = buffer
            .as_slice()
            .iter()
            .map(|&v| {
                if v.is_finite() && v >= 0.0 {
                    Ok(v.round() as u32)
                } else {
                    Err(LiveMapError::Transport(format!(
                        "invalid contact count {v}"
                    )))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_cells(side, cells))
    }
}
