use serde::{Deserialize, Serialize};

/// Leaf size used when no options are supplied.
pub const DEFAULT_NODE_SIZE: u32 = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
/// Spatial index construction options.
pub struct IndexOptions {
    /// Largest partition left unsplit. Smaller values give deeper trees
    /// and shorter leaf scans.
    pub node_size: u32,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            node_size: DEFAULT_NODE_SIZE,
        }
    }
}
