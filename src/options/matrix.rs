use serde::{Deserialize, Serialize};

/// Largest matrix side accepted when no options are supplied.
pub const DEFAULT_MAX_SIDE: u32 = 16_384;

/// Limits on the matrices an engine will allocate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatrixOptions {
    /// Requests asking for a wider matrix are refused before any cell is
    /// allocated.
    pub max_side: u32,
}

impl Default for MatrixOptions {
    fn default() -> Self {
        Self {
            max_side: DEFAULT_MAX_SIDE,
        }
    }
}
