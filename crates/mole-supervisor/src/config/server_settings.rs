use crate::config::{DEFAULT_HOST, DEFAULT_PORT};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host the server binds to (loopback only)
    pub host: String,

    /// Fixed port handed to the server
    pub port: u16,

    /// Stop the server from opening its own browser window
    pub suppress_browser: bool,

    /// Static asset templates (development trees only)
    pub templates_dir: Option<PathBuf>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            suppress_browser: true,
            templates_dir: None,
        }
    }
}
