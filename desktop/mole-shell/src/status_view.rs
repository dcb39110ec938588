//! Front-end facing view of a status transition.

use mole_supervisor::{FailureKind, ServerStatus, StatusChange};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub state: String,
    pub cycle: u64,
    pub at: DateTime<Utc>,
    pub url: Option<String>,
    pub pid: Option<u32>,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub recovery_hint: Option<String>,
    pub is_running: bool,
}

/// Converts a supervisor transition to what the shell prints.
///
/// The URL is only exposed once the server answered healthy.
pub fn build_status_view(change: &StatusChange, server_url: &str, pid: Option<u32>) -> StatusView {
    let (url, error, failure_kind, recovery_hint) = match &change.status {
        ServerStatus::NotStarted | ServerStatus::Starting => (None, None, None, None),
        ServerStatus::Running => (Some(server_url.to_string()), None, None, None),
        ServerStatus::Failed { kind, reason } => (
            None,
            Some(reason.clone()),
            Some(*kind),
            Some(kind.recovery_hint().to_string()),
        ),
    };

    StatusView {
        state: change.status.label().into(),
        cycle: change.cycle,
        at: change.at,
        url,
        pid,
        error,
        failure_kind,
        recovery_hint,
        is_running: change.status.is_running(),
    }
}

impl StatusView {
    /// One human-readable message per transition.
    pub fn render_text(&self) -> String {
        match (self.state.as_str(), &self.url, &self.error) {
            ("running", Some(url), _) => match self.pid {
                Some(pid) => format!("Server running at {url} (PID {pid})"),
                None => format!("Server running at {url}"),
            },
            ("starting", _, _) => format!("Starting server (cycle {})...", self.cycle),
            ("failed", _, Some(error)) => match &self.recovery_hint {
                Some(hint) => format!("{error}\n\nHint: {hint}"),
                None => error.clone(),
            },
            _ => "Server stopped".into(),
        }
    }
}
