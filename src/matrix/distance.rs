use glam::DVec3;

use super::{buffer_side, DistanceMatrix, MatrixBuffer, SquareMatrix};
use crate::error::LiveMapError;
use crate::trace::Trace;

/// Wire value of a cell with no defined distance.
pub const DISTANCE_UNDEFINED: f32 = -1.0;

/// All pairwise distances between the present segments of `trace`.
///
/// Present segments get a zero diagonal; every cell touching a missing
/// segment stays `None`. The second value is the largest off-diagonal
/// distance, `None` when the trace has fewer than two present points.
///
/// # Errors
///
/// [`LiveMapError::Bounds`] if the trace is longer than
/// `maximum_segment_id`, [`LiveMapError::Construction`] if a present point
/// is not finite, [`LiveMapError::Transport`] if the matrix cannot be
/// allocated.
pub fn compute_trace_distances(
    trace: &Trace,
    maximum_segment_id: u32,
) -> Result<(DistanceMatrix, Option<f64>), LiveMapError> {
    trace.validate(maximum_segment_id)?;
    let mut matrix =
        DistanceMatrix::try_filled(maximum_segment_id as usize, None)?;
    let max_distance = fill_trace_distances(&mut matrix, trace);
    Ok((matrix, max_distance))
}

/// Per-cell mean of the defined distances across `traces`.
///
/// Each cell averages only the traces in which both of its segments are
/// present, using the running update `avg += (sample - avg) / k`. Cells
/// with no sample stay `None`. The second value is the largest defined
/// cell of the result.
///
/// # Errors
///
/// As [`compute_trace_distances`], for any trace of the ensemble.
pub fn compute_ensemble_average_distances(
    traces: &[Trace],
    maximum_segment_id: u32,
) -> Result<(DistanceMatrix, Option<f64>), LiveMapError> {
    for trace in traces {
        trace.validate(maximum_segment_id)?;
    }

    let side = maximum_segment_id as usize;
    let mut averages = DistanceMatrix::try_filled(side, None)?;
    let mut counters = SquareMatrix::try_filled(side, 0_u32)?;
    let mut scratch = DistanceMatrix::try_filled(side, None)?;

    for trace in traces {
        scratch.cells_mut().fill(None);
        let _ = fill_trace_distances(&mut scratch, trace);

        let cells = averages
            .cells_mut()
            .iter_mut()
            .zip(counters.cells_mut().iter_mut());
        for ((average, count), sample) in cells.zip(scratch.cells()) {
            let Some(sample) = *sample else {
                continue;
            };
            *count += 1;
            *average = Some(match *average {
                None => sample,
                Some(a) => a + (sample - a) / f64::from(*count),
            });
        }
    }

    let max_average = averages.max_distance();
    Ok((averages, max_average))
}

/// Write one trace's distances into a matrix of `None`s, returning the
/// largest off-diagonal distance.
fn fill_trace_distances(
    matrix: &mut DistanceMatrix,
    trace: &Trace,
) -> Option<f64> {
    let present: Vec<(usize, DVec3)> = trace
        .present()
        .map(|(i, p)| (i as usize, p.position()))
        .collect();

    let mut max_distance: Option<f64> = None;
    for (a, &(i, pi)) in present.iter().enumerate() {
        matrix.set_symmetric(i, i, Some(0.0));
        for &(j, pj) in &present[a + 1..] {
            let d = pi.distance(pj);
            matrix.set_symmetric(i, j, Some(d));
            max_distance = Some(max_distance.map_or(d, |m| m.max(d)));
        }
    }
    max_distance
}

impl DistanceMatrix {
    /// Largest defined cell, diagonal included.
    #[must_use]
    pub fn max_distance(&self) -> Option<f64> {
        self.cells()
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }

    /// Distances as a wire buffer, undefined cells as
    /// [`DISTANCE_UNDEFINED`].
    #[must_use]
    pub fn into_buffer(self) -> MatrixBuffer {
        MatrixBuffer::new(
            self.cells()
                .iter()
                .map(|c| c.map_or(DISTANCE_UNDEFINED, |d| d as f32))
                .collect(),
        )
    }

    /// Rebuild a distance matrix from a received buffer; negative cells
    /// decode to `None`.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Transport`] if the buffer is not square.
    pub fn from_buffer(buffer: &MatrixBuffer) -> Result<Self, LiveMapError> {
        let side = buffer_side(buffer)?;
        let cells = buffer
            .as_slice()
            .iter()
            .map(|&v| (v >= 0.0).then(|| f64::from(v)))
            .collect();
        Ok(Self::from_cells(side, cells))
    }
}
