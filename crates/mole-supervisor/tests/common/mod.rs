#![allow(dead_code)]

use mole_supervisor::{
    BinaryLocator, HttpHealthProbe, ProcessSupervisor, ServerStatus, StatusChange,
    SupervisorConfig,
};

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HEALTH_INTERVAL_MS: u64 = 20;
pub const FILE_WAIT: Duration = Duration::from_secs(5);

/// Scratch directory plus a health endpoint answering a fixed status
pub struct TestHarness {
    pub dir: TempDir,
    pub health: MockServer,
}

impl TestHarness {
    pub async fn answering(status: u16) -> Self {
        let health = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&health)
            .await;

        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
            health,
        }
    }

    pub fn config(&self) -> SupervisorConfig {
        let mut config = SupervisorConfig::default();
        config.server.port = self.health.address().port();
        config.health.interval_ms = HEALTH_INTERVAL_MS;
        config.health.request_timeout_ms = 250;
        config.log_sink.directory = Some(self.dir.path().to_path_buf());
        config
    }

    pub fn marker(&self) -> PathBuf {
        self.dir.path().join("marker")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("server.log")
    }

    /// Server stand-in that records launches and SIGTERM in the marker file
    pub fn server_script(&self) -> PathBuf {
        let marker = self.marker();
        let body = format!(
            "trap 'echo terminated >> \"{m}\"; exit 0' TERM\n\
             echo launched >> \"{m}\"\n\
             echo \"port=$MOLE_PORT host=$MOLE_HOST no_open=$MOLE_NO_OPEN\"\n\
             while true; do sleep 1 & wait $!; done\n",
            m = marker.display()
        );
        write_script(self.dir.path(), "web-go", &body, 0o755)
    }

    pub fn supervisor(&self, config: SupervisorConfig, binary: PathBuf) -> ProcessSupervisor {
        self.supervisor_with(config, BinaryLocator::new(vec![binary]))
    }

    pub fn supervisor_with(
        &self,
        config: SupervisorConfig,
        locator: BinaryLocator,
    ) -> ProcessSupervisor {
        let probe = HttpHealthProbe::from_config(&config).expect("Failed to build health probe");
        ProcessSupervisor::with_parts(config, locator, Arc::new(probe))
    }

    pub async fn health_requests(&self) -> usize {
        self.health
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    pub fn marker_lines(&self, line: &str) -> usize {
        count_lines(&self.marker(), line)
    }

    /// Wait until the marker holds `count` copies of `line`
    pub async fn wait_for_marker(&self, line: &str, count: usize) -> bool {
        wait_for(|| count_lines(&self.marker(), line) >= count).await
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
        .expect("Failed to set script permissions");
    path
}

pub fn count_lines(path: &Path, line: &str) -> usize {
    std::fs::read_to_string(path)
        .map(|content| content.lines().filter(|l| *l == line).count())
        .unwrap_or_default()
}

pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + FILE_WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Next transition, failing the test if none arrives in time
pub async fn next_change(changes: &mut broadcast::Receiver<StatusChange>) -> StatusChange {
    tokio::time::timeout(FILE_WAIT, changes.recv())
        .await
        .expect("Timed out waiting for status change")
        .expect("Status channel closed")
}

pub async fn settle(supervisor: &ProcessSupervisor) -> ServerStatus {
    tokio::time::timeout(FILE_WAIT, supervisor.wait_settled())
        .await
        .expect("Start cycle did not settle")
}
