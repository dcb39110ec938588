//! Bounded, sequential health polling for one start cycle.

use crate::{HealthProbe, HealthSettings};

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a poll cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Attempt number `attempts` answered healthy
    Healthy { attempts: u32 },
    /// Every attempt in the budget failed
    Exhausted { attempts: u32 },
    /// The cycle token was cancelled after `attempts` completed attempts
    Cancelled { attempts: u32 },
}

/// The attempt schedule for one `Starting` phase.
///
/// Each attempt waits `interval` after the previous one completed, so at
/// most one request is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCycle {
    interval: Duration,
    max_attempts: u32,
}

impl PollCycle {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_settings(settings: &HealthSettings) -> Self {
        Self::new(settings.interval(), settings.max_attempts)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Poll until the first healthy answer, the budget runs out, or `token` is cancelled.
    pub async fn run(&self, probe: &dyn HealthProbe, token: &CancellationToken) -> PollOutcome {
        let mut attempts = 0;

        while attempts < self.max_attempts {
            tokio::select! {
                biased;
                _ = token.cancelled() => return PollOutcome::Cancelled { attempts },
                _ = tokio::time::sleep(self.interval) => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return PollOutcome::Cancelled { attempts },
                outcome = probe.probe() => outcome,
            };
            attempts += 1;

            if outcome.is_healthy() {
                info!("Health check passed on attempt {attempts}/{}", self.max_attempts);
                return PollOutcome::Healthy { attempts };
            }

            debug!(
                "Health attempt {attempts}/{} failed: {outcome:?}",
                self.max_attempts
            );
        }

        warn!("Server not healthy after {attempts} attempts");
        PollOutcome::Exhausted { attempts }
    }
}
