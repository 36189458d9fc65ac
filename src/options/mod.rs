//! Centralized compute options with TOML preset support.
//!
//! Tunables for the spatial index, the matrix size limit and the
//! contact-frequency engine are consolidated here. Options serialize
//! to/from TOML so a deployment can ship presets next to its data.

mod contact;
mod index;
mod matrix;

use std::path::Path;

pub use contact::ContactOptions;
pub use index::{IndexOptions, DEFAULT_NODE_SIZE};
pub use matrix::{MatrixOptions, DEFAULT_MAX_SIDE};
use serde::{Deserialize, Serialize};

use crate::error::LiveMapError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[contact]`) work correctly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Options {
    /// Spatial index parameters.
    pub index: IndexOptions,
    /// Matrix allocation limits.
    pub matrix: MatrixOptions,
    /// Contact-frequency engine parameters.
    pub contact: ContactOptions,
}

impl Options {
    /// Parse options from TOML text. Absent tables and keys keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::OptionsParse`] for malformed TOML or mistyped keys.
    pub fn from_toml(text: &str) -> Result<Self, LiveMapError> {
        toml::from_str(text)
            .map_err(|e| LiveMapError::OptionsParse(e.to_string()))
    }

    /// Read a preset file.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml`](Self::from_toml).
    pub fn load(path: &Path) -> Result<Self, LiveMapError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Write these options as pretty TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// [`LiveMapError::OptionsParse`] if serialization fails,
    /// [`LiveMapError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), LiveMapError> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| LiveMapError::OptionsParse(e.to_string()))?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Sorted stems of the `.toml` files in `dir`; empty if the directory
    /// cannot be read.
    #[must_use]
    pub fn list_presets(dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .filter_map(|path| {
                path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
            })
            .collect();
        names.sort();
        names
    }
}
