//! Health endpoint probing.

use crate::{Result as SupervisorResult, SupervisorConfig};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Result of a single health attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Endpoint answered 200
    Healthy,
    /// Endpoint answered with some other status
    Unhealthy { status: u16 },
    /// Connection refused, timed out or otherwise failed
    Unreachable { error: String },
}

impl ProbeOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// One health attempt against the supervised server.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self) -> ProbeOutcome;
}

/// GETs the configured health URL with a short per-request timeout.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> SupervisorResult<Self> {
        // Loopback only; HTTP_PROXY and friends must not reroute it
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &SupervisorConfig) -> SupervisorResult<Self> {
        Self::new(config.health_url(), config.health.request_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self) -> ProbeOutcome {
        let start = Instant::now();
        let result = self.client.get(&self.url).send().await;
        let latency_ms = start.elapsed().as_millis();

        let outcome = match result {
            Ok(resp) if resp.status() == StatusCode::OK => ProbeOutcome::Healthy,
            Ok(resp) => ProbeOutcome::Unhealthy {
                status: resp.status().as_u16(),
            },
            Err(e) => ProbeOutcome::Unreachable {
                error: e.to_string(),
            },
        };

        debug!("GET {} -> {outcome:?} ({latency_ms}ms)", self.url);
        outcome
    }
}
