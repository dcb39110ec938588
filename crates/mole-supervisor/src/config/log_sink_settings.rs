use crate::config::DEFAULT_LOG_FILE_NAME;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the server's stdout/stderr end up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSinkSettings {
    /// Directory for the log file (defaults to the support directory)
    pub directory: Option<PathBuf>,

    pub file_name: String,
}

impl Default for LogSinkSettings {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: DEFAULT_LOG_FILE_NAME.into(),
        }
    }
}
