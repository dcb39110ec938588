use crate::config::{
    DEFAULT_HEALTH_INTERVAL_MS, DEFAULT_HEALTH_MAX_ATTEMPTS, DEFAULT_HEALTH_PATH,
    DEFAULT_HEALTH_REQUEST_TIMEOUT_MS,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Endpoint path on the server
    pub path: String,

    /// Delay before each attempt (milliseconds)
    pub interval_ms: u64,

    /// Attempt budget for one start cycle
    pub max_attempts: u32,

    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,
}

impl HealthSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_HEALTH_PATH.into(),
            interval_ms: DEFAULT_HEALTH_INTERVAL_MS,
            max_attempts: DEFAULT_HEALTH_MAX_ATTEMPTS,
            request_timeout_ms: DEFAULT_HEALTH_REQUEST_TIMEOUT_MS,
        }
    }
}
