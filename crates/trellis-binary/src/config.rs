//! File binary store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use trellis_core::TOKEN_LENGTH;

use crate::error::{BinaryError, Result};

/// Default number of shard directories between the base path and a file.
pub const DEFAULT_HIERARCHY: usize = 3;

/// Default characters per shard directory name.
pub const DEFAULT_LENGTH: usize = 2;

/// Settings for [`FileBinaryService`](crate::FileBinaryService).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBinaryConfig {
    /// Root directory. Required; there is no default location.
    pub base_path: Option<PathBuf>,
    /// Shard depth.
    pub hierarchy: usize,
    /// Shard segment length.
    pub length: usize,
}

impl Default for FileBinaryConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            hierarchy: DEFAULT_HIERARCHY,
            length: DEFAULT_LENGTH,
        }
    }
}

impl FileBinaryConfig {
    /// Default layout rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: Some(base_path.into()),
            ..Self::default()
        }
    }

    /// Check the settings describe a usable layout.
    pub fn validate(&self) -> Result<()> {
        match &self.base_path {
            None => return Err(BinaryError::Config("binary base path is required".into())),
            Some(path) if path.as_os_str().is_empty() => {
                return Err(BinaryError::Config("binary base path is empty".into()))
            }
            Some(_) => {}
        }

        if self.hierarchy > 0 && self.length == 0 {
            return Err(BinaryError::Config(
                "shard length must be positive when hierarchy is non-zero".into(),
            ));
        }

        if self.hierarchy.saturating_mul(self.length) > TOKEN_LENGTH {
            return Err(BinaryError::Config(format!(
                "hierarchy {} x length {} exceeds identifier token length {}",
                self.hierarchy, self.length, TOKEN_LENGTH
            )));
        }

        Ok(())
    }
}
