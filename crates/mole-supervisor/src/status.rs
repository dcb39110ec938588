//! Observable server status and transition events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::info;

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Category of a failed start cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No candidate binary exists on disk
    Resolution,
    /// The OS refused to execute the resolved binary
    Spawn,
    /// The process launched but never answered healthy
    HealthTimeout,
}

impl FailureKind {
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Resolution => {
                "The server binary is missing. \
                   Reinstall Mole or build the web server into bin/."
            }
            Self::Spawn => {
                "The server binary could not be executed. \
                   Check its permissions and that it was built for this machine."
            }
            Self::HealthTimeout => {
                "The server did not become ready in time. \
                   Check server.log for errors or whether another program holds the port."
            }
        }
    }
}

/// Current state of the supervised server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerStatus {
    /// No process owned
    NotStarted,
    /// Process launched, health polling in progress
    Starting,
    /// Health check succeeded once
    Running,
    /// The current start cycle ended without a healthy server
    Failed { kind: FailureKind, reason: String },
}

impl ServerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed { .. } => "failed",
        }
    }

    /// A start cycle has reached its final state.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Running | Self::Failed { .. })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A single status transition, as delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    /// Start cycle the transition belongs to (0 before the first start)
    pub cycle: u64,
    pub status: ServerStatus,
    pub at: DateTime<Utc>,
}

/// Publishes status to both the latest-value and event channels.
///
/// Owned by the supervisor task; nothing else writes status.
pub(crate) struct StatusPublisher {
    current_tx: watch::Sender<ServerStatus>,
    changes_tx: broadcast::Sender<StatusChange>,
}

impl StatusPublisher {
    pub(crate) fn new() -> Self {
        let (current_tx, _) = watch::channel(ServerStatus::NotStarted);
        let (changes_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current_tx,
            changes_tx,
        }
    }

    pub(crate) fn current(&self) -> ServerStatus {
        self.current_tx.borrow().clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ServerStatus> {
        self.current_tx.subscribe()
    }

    pub(crate) fn changes_sender(&self) -> broadcast::Sender<StatusChange> {
        self.changes_tx.clone()
    }

    pub(crate) fn publish(&self, cycle: u64, status: ServerStatus) {
        info!("Server status: {} (cycle {cycle})", status.label());

        self.current_tx.send_replace(status.clone());

        // No subscribers is fine
        let _ = self.changes_tx.send(StatusChange {
            cycle,
            status,
            at: Utc::now(),
        });
    }
}
