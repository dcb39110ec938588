use crate::config::DEFAULT_BINARY_NAME;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarySettings {
    /// File name probed for in every candidate directory
    pub name: String,

    /// Explicit path, probed before the built-in locations
    pub path: Option<PathBuf>,
}

impl Default for BinarySettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_BINARY_NAME.into(),
            path: None,
        }
    }
}
