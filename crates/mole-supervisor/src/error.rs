use crate::status::FailureKind;

use std::panic::Location;
use std::path::PathBuf;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration invalid: {message} {location}")]
    ConfigInvalid {
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source} {location}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("TOML parse error in {path}: {source} {location}")]
    ConfigToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
        location: ErrorLocation,
    },

    #[error("No per-user support directory available on this platform {location}")]
    NoSupportDir { location: ErrorLocation },

    #[error("Server binary not found ({count} paths checked) {location}", count = .checked.len())]
    BinaryNotFound {
        checked: Vec<PathBuf>,
        location: ErrorLocation,
    },

    #[error("Failed to spawn {path}: {source} {location}")]
    ProcessSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Server did not answer healthy after {attempts} attempts {location}")]
    HealthTimeout {
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("HTTP client error: {source} {location}")]
    HttpClient {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn binary_not_found(checked: Vec<PathBuf>) -> Self {
        Self::BinaryNotFound {
            checked,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn process_spawn(path: PathBuf, source: std::io::Error) -> Self {
        Self::ProcessSpawn {
            path,
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn health_timeout(attempts: u32) -> Self {
        Self::HealthTimeout {
            attempts,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Which failure category of a start cycle this error represents, if any.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::BinaryNotFound { .. } => Some(FailureKind::Resolution),
            Self::ProcessSpawn { .. } => Some(FailureKind::Spawn),
            Self::HealthTimeout { .. } => Some(FailureKind::HealthTimeout),
            _ => None,
        }
    }

    /// User-facing failure text, without source locations.
    ///
    /// This is what ends up in `ServerStatus::Failed` and what the
    /// presentation layer shows next to its retry action.
    pub fn reason(&self) -> String {
        match self {
            Self::BinaryNotFound { checked, .. } => {
                let paths = checked
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("Server binary not found. Checked paths:\n{paths}")
            }
            Self::ProcessSpawn { source, .. } => format!("Failed to start server: {source}"),
            Self::HealthTimeout { attempts, .. } => {
                format!("Server failed to start after {attempts} attempts")
            }
            Self::ConfigInvalid { message, .. } => format!("Configuration invalid: {message}"),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for SupervisorError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::HttpClient {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
