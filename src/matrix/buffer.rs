use serde::{Deserialize, Serialize};

/// Flattened `f32` matrix handed from a worker to its caller.
///
/// The buffer is move-only: sending it through a channel hands over the
/// heap allocation without copying the cells, and the sender can no
/// longer reach it.
#[derive(Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixBuffer {
    values: Vec<f32>,
}

impl MatrixBuffer {
    /// Take ownership of row-major cell values.
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the buffer holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Matrix side, when the length is a perfect square.
    #[must_use]
    pub fn side(&self) -> Option<usize> {
        let side = (self.values.len() as f64).sqrt().round() as usize;
        (side * side == self.values.len()).then_some(side)
    }

    /// Row-major cell values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Native-endian bytes of the cell values.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    /// Release the backing storage.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

impl From<Vec<f32>> for MatrixBuffer {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}
