//! Square, symmetric segment-by-segment matrices.
//!
//! Both data products are stored row-major in a flat array of side
//! `maximumSegmentID`. Writes go through [`SquareMatrix::set_symmetric`]
//! and friends, so `M[i, j] == M[j, i]` holds by construction.

mod buffer;
mod contact;
mod distance;

pub use buffer::MatrixBuffer;
pub use contact::{
    compute_contact_frequency, compute_contact_frequency_with_node_size,
    ContactRecord, ContactRecordList,
};
pub use distance::{
    compute_ensemble_average_distances, compute_trace_distances,
    DISTANCE_UNDEFINED,
};

use crate::error::LiveMapError;

/// Contact counts; the diagonal counts traces in which a segment is present.
pub type ContactMatrix = SquareMatrix<u32>;

/// Pairwise distances; `None` marks a pair with no defined distance.
pub type DistanceMatrix = SquareMatrix<Option<f64>>;

/// Row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix<T> {
    side: usize,
    cells: Vec<T>,
}

impl<T: Copy> SquareMatrix<T> {
    /// A `side x side` matrix with every cell set to `value`.
    #[must_use]
    pub fn filled(side: usize, value: T) -> Self {
        Self {
            side,
            cells: vec![value; side * side],
        }
    }

    /// Like [`filled`](Self::filled), but reports a matrix too large to
    /// allocate instead of aborting.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Transport`] if `side * side` overflows or the cells
    /// cannot be reserved.
    pub fn try_filled(side: usize, value: T) -> Result<Self, LiveMapError> {
        let too_large = || {
            LiveMapError::Transport(format!(
                "cannot allocate a {side}x{side} matrix"
            ))
        };
        let len = side.checked_mul(side).ok_or_else(too_large)?;
        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|_| too_large())?;
        cells.resize(len, value);
        Ok(Self { side, cells })
    }

    /// Number of rows (and columns).
    #[must_use]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Cell `(i, j)`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.cells[i * self.side + j]
    }

    /// Write `value` to `(i, j)` and `(j, i)`.
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: T) {
        self.cells[i * self.side + j] = value;
        self.cells[j * self.side + i] = value;
    }

    /// Flat row-major cells.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    fn from_cells(side: usize, cells: Vec<T>) -> Self {
        debug_assert_eq!(cells.len(), side * side);
        Self { side, cells }
    }
}

impl<T: Copy + PartialEq> SquareMatrix<T> {
    /// Whether `M[i, j] == M[j, i]` for every pair.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        (0..self.side).all(|i| {
            (i + 1..self.side).all(|j| self.get(i, j) == self.get(j, i))
        })
    }
}

/// Side length of a received buffer, or a transport error when its length
/// is not a perfect square.
fn buffer_side(buffer: &MatrixBuffer) -> Result<usize, LiveMapError> {
    buffer.side().ok_or_else(|| {
        LiveMapError::Transport(format!(
            "matrix buffer of length {} is not square",
            buffer.len()
        ))
    })
}
