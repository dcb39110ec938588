//! Supervisor configuration with validation.
//!
//! Every field has a default, so running without a config file reproduces
//! the fixed launch contract: port 8081 on 127.0.0.1, `/health` polled every
//! 500ms for at most 20 attempts.

mod binary_settings;
mod health_settings;
mod log_sink_settings;
mod server_settings;

pub use binary_settings::BinarySettings;
pub use health_settings::HealthSettings;
pub use log_sink_settings::LogSinkSettings;
pub use server_settings::ServerSettings;

use crate::{Result as SupervisorResult, SupervisorError};

use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const APP_DIR_NAME: &str = "Mole";

pub const ENV_CONFIG_DIR: &str = "MOLE_SHELL_CONFIG_DIR";
pub const ENV_BINARY: &str = "MOLE_SHELL_BINARY";
pub const ENV_PORT: &str = "MOLE_SHELL_PORT";
pub const ENV_TEMPLATES: &str = "MOLE_SHELL_TEMPLATES";

pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 8081;
pub(crate) const DEFAULT_BINARY_NAME: &str = "web-go";
pub(crate) const DEFAULT_HEALTH_PATH: &str = "/health";
pub(crate) const DEFAULT_HEALTH_INTERVAL_MS: u64 = 500;
pub(crate) const DEFAULT_HEALTH_MAX_ATTEMPTS: u32 = 20;
pub(crate) const DEFAULT_HEALTH_REQUEST_TIMEOUT_MS: u64 = 750;
pub(crate) const DEFAULT_LOG_FILE_NAME: &str = "server.log";

const MIN_PORT: u16 = 1024;
const MIN_MAX_ATTEMPTS: u32 = 1;
const MAX_MAX_ATTEMPTS: u32 = 600;
const MIN_INTERVAL_MS: u64 = 10;
const MAX_INTERVAL_MS: u64 = 60_000;
const MIN_REQUEST_TIMEOUT_MS: u64 = 1;
const MAX_REQUEST_TIMEOUT_MS: u64 = 999;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub server: ServerSettings,
    pub binary: BinarySettings,
    pub health: HealthSettings,
    pub log_sink: LogSinkSettings,
}

impl SupervisorConfig {
    /// Load config from the config directory.
    ///
    /// Loading order:
    /// 1. MOLE_SHELL_CONFIG_DIR, else the platform config dir + "Mole"
    /// 2. config.toml if it exists, else defaults
    /// 3. MOLE_SHELL_* environment overrides
    ///
    /// Does NOT validate - call validate() after load().
    pub fn load() -> SupervisorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load from an explicit directory, then apply environment overrides.
    pub fn load_from(config_dir: &Path) -> SupervisorResult<Self> {
        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.exists() {
            Self::load_toml(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_toml(path: &Path) -> SupervisorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SupervisorError::ConfigIo {
            path: path.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })?;

        toml::from_str(&contents).map_err(|e| SupervisorError::ConfigToml {
            path: path.to_path_buf(),
            source: e,
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Priority: MOLE_SHELL_CONFIG_DIR > <config dir>/Mole
    pub fn config_dir() -> SupervisorResult<PathBuf> {
        if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
            return Ok(PathBuf::from(dir));
        }

        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| SupervisorError::NoSupportDir {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Per-application support directory (Application Support/Mole on macOS).
    pub fn support_dir() -> SupervisorResult<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| SupervisorError::NoSupportDir {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// File that receives the server's stdout and stderr.
    pub fn log_path(&self) -> SupervisorResult<PathBuf> {
        let directory = match &self.log_sink.directory {
            Some(dir) => dir.clone(),
            None => Self::support_dir()?,
        };
        Ok(directory.join(&self.log_sink.file_name))
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.server_url(), self.health.path)
    }

    pub fn validate(&self) -> SupervisorResult<()> {
        if self.server.host != DEFAULT_HOST && self.server.host != "localhost" {
            return Err(SupervisorError::config(format!(
                "server.host must be {DEFAULT_HOST} or localhost, got {}",
                self.server.host
            )));
        }

        if self.server.port < MIN_PORT {
            return Err(SupervisorError::config(format!(
                "server.port must be >= {MIN_PORT}, got {}",
                self.server.port
            )));
        }

        if self.binary.name.is_empty()
            || self.binary.name.contains('/')
            || self.binary.name.contains('\\')
        {
            return Err(SupervisorError::config(format!(
                "binary.name must be a bare file name, got {:?}",
                self.binary.name
            )));
        }

        if !self.health.path.starts_with('/') {
            return Err(SupervisorError::config(format!(
                "health.path must start with '/', got {:?}",
                self.health.path
            )));
        }

        if self.health.max_attempts < MIN_MAX_ATTEMPTS
            || self.health.max_attempts > MAX_MAX_ATTEMPTS
        {
            return Err(SupervisorError::config(format!(
                "health.max_attempts must be {MIN_MAX_ATTEMPTS}-{MAX_MAX_ATTEMPTS}, got {}",
                self.health.max_attempts
            )));
        }

        if self.health.interval_ms < MIN_INTERVAL_MS || self.health.interval_ms > MAX_INTERVAL_MS
        {
            return Err(SupervisorError::config(format!(
                "health.interval_ms must be {MIN_INTERVAL_MS}-{MAX_INTERVAL_MS}, got {}",
                self.health.interval_ms
            )));
        }

        // Per-attempt timeout stays sub-second
        if self.health.request_timeout_ms < MIN_REQUEST_TIMEOUT_MS
            || self.health.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS
        {
            return Err(SupervisorError::config(format!(
                "health.request_timeout_ms must be {MIN_REQUEST_TIMEOUT_MS}-{MAX_REQUEST_TIMEOUT_MS}, got {}",
                self.health.request_timeout_ms
            )));
        }

        if self.log_sink.file_name.is_empty() {
            return Err(SupervisorError::config("log_sink.file_name must not be empty"));
        }

        Ok(())
    }

    pub fn log_summary(&self) {
        info!("Supervisor configuration:");
        info!("  server: {} (no_open: {})", self.server_url(), self.server.suppress_browser);
        if let Some(ref templates) = self.server.templates_dir {
            info!("  templates: {}", templates.display());
        }
        match self.binary.path {
            Some(ref path) => info!("  binary: {} (explicit)", path.display()),
            None => info!("  binary: {}", self.binary.name),
        }
        info!(
            "  health: {} every {}ms, {} attempts, {}ms timeout",
            self.health.path,
            self.health.interval_ms,
            self.health.max_attempts,
            self.health.request_timeout_ms
        );
        match self.log_path() {
            Ok(path) => info!("  server log: {}", path.display()),
            Err(e) => info!("  server log: unavailable ({e})"),
        }
    }

    fn apply_env_overrides(&mut self) {
        Self::apply_env_option_path(ENV_BINARY, &mut self.binary.path);
        Self::apply_env_parse(ENV_PORT, &mut self.server.port);
        Self::apply_env_option_path(ENV_TEMPLATES, &mut self.server.templates_dir);
    }

    fn apply_env_parse<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(val) = std::env::var(var_name)
            && let Ok(parsed) = val.parse()
        {
            *target = parsed;
        }
    }

    fn apply_env_option_path(var_name: &str, target: &mut Option<PathBuf>) {
        if let Ok(val) = std::env::var(var_name)
            && !val.is_empty()
        {
            *target = Some(PathBuf::from(val));
        }
    }
}
