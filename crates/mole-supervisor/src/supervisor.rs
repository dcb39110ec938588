//! Server process supervision with a health-gated start.

use crate::{
    BinaryLocator, FailureKind, HealthProbe, HttpHealthProbe, PollCycle, PollOutcome,
    Result as SupervisorResult, ServerEnvironment, ServerProcess, ServerStatus, StatusChange,
    StatusPublisher, SupervisorConfig, SupervisorError, TemplateLocator,
};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const COMMAND_CHANNEL_CAPACITY: usize = 16;
const REPORT_CHANNEL_CAPACITY: usize = 4;

/// Commands from handles to the owner task.
#[derive(Debug)]
enum SupervisorCommand {
    Start { ack: oneshot::Sender<()> },
    Stop { ack: oneshot::Sender<()> },
    Pid { reply: oneshot::Sender<Option<u32>> },
}

/// Result of a poll task, delivered back to the owner task.
#[derive(Debug)]
struct PollReport {
    cycle: u64,
    outcome: PollOutcome,
}

/// The `Starting` phase currently in progress.
struct ActiveCycle {
    id: u64,
    token: CancellationToken,
}

/// Handle to the server supervisor.
///
/// All state lives in a single owner task; handles only send commands and
/// observe status. Cloning is cheap and every clone talks to the same
/// owner. When the last handle is dropped the owner stops the server.
///
/// Responsibilities:
/// - Resolve and spawn the server binary
/// - Gate `Running` on the health endpoint answering 200
/// - Report every failure as `ServerStatus::Failed`
/// - Terminate the server on stop
#[derive(Clone)]
pub struct ProcessSupervisor {
    config: Arc<SupervisorConfig>,
    command_tx: mpsc::Sender<SupervisorCommand>,
    status_rx: watch::Receiver<ServerStatus>,
    changes_tx: broadcast::Sender<StatusChange>,
}

impl ProcessSupervisor {
    /// Create a supervisor probing the configured health URL over HTTP.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: SupervisorConfig) -> SupervisorResult<Self> {
        let probe = HttpHealthProbe::from_config(&config)?;
        let locator = BinaryLocator::from_config(&config);
        Ok(Self::with_parts(config, locator, Arc::new(probe)))
    }

    /// Create a supervisor with an explicit locator and health probe.
    pub fn with_parts(
        config: SupervisorConfig,
        locator: BinaryLocator,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (report_tx, report_rx) = mpsc::channel(REPORT_CHANNEL_CAPACITY);

        let publisher = StatusPublisher::new();
        let status_rx = publisher.watch();
        let changes_tx = publisher.changes_sender();

        let log_path = config.log_path().unwrap_or_else(|e| {
            let fallback = std::env::temp_dir()
                .join(crate::config::APP_DIR_NAME)
                .join(&config.log_sink.file_name);
            warn!("{e}; server output goes to {}", fallback.display());
            fallback
        });

        let environment =
            ServerEnvironment::resolve(&config, &TemplateLocator::from_environment());

        let task = SupervisorTask {
            environment,
            poll: PollCycle::from_settings(&config.health),
            locator,
            probe,
            log_path,
            process: None,
            cycle: None,
            cycle_id: 0,
            publisher,
            command_rx,
            report_tx,
            report_rx,
        };
        tokio::spawn(task.run());

        Self {
            config: Arc::new(config),
            command_tx,
            status_rx,
            changes_tx,
        }
    }

    /// Begin a start cycle.
    ///
    /// No-op while a cycle is in flight or the server is running; a server
    /// that exited after reaching `Running` is started again. Returns
    /// once the command has been applied, so the status is then `Starting`,
    /// `Failed`, or whatever it was before a no-op.
    pub async fn start(&self) {
        self.request(|ack| SupervisorCommand::Start { ack }).await;
    }

    /// Cancel polling and terminate the server. Safe to call any number of times.
    pub async fn stop(&self) {
        self.request(|ack| SupervisorCommand::Stop { ack }).await;
    }

    async fn request(&self, command: impl FnOnce(oneshot::Sender<()>) -> SupervisorCommand) {
        let (ack_tx, ack_rx) = oneshot::channel();

        if self.command_tx.send(command(ack_tx)).await.is_err() {
            warn!("Supervisor task has exited; command dropped");
            return;
        }

        // The owner always acks; an error means it exited meanwhile
        let _ = ack_rx.await;
    }

    pub fn status(&self) -> ServerStatus {
        self.status_rx.borrow().clone()
    }

    /// Latest-value view of the status.
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.status_rx.clone()
    }

    /// Every transition from now on, in order.
    pub fn changes(&self) -> broadcast::Receiver<StatusChange> {
        self.changes_tx.subscribe()
    }

    /// Wait until the current start cycle reaches `Running` or `Failed`.
    ///
    /// Returns `NotStarted` immediately when no cycle is in flight, e.g.
    /// before the first `start()` or after `stop()`.
    pub async fn wait_settled(&self) -> ServerStatus {
        let mut rx = self.status_rx.clone();
        rx.wait_for(|status| *status != ServerStatus::Starting)
            .await
            .map(|status| (*status).clone())
            .unwrap_or_else(|_| self.status())
    }

    /// PID of the owned server process, if any.
    pub async fn pid(&self) -> Option<u32> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(SupervisorCommand::Pid { reply: reply_tx })
            .await
            .ok()?;
        reply_rx.await.ok().flatten()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// URL the presentation layer loads once the server is running.
    pub fn server_url(&self) -> String {
        self.config.server_url()
    }
}

/// Sole owner of the process handle, the poll cycle and the status.
struct SupervisorTask {
    environment: ServerEnvironment,
    poll: PollCycle,
    locator: BinaryLocator,
    probe: Arc<dyn HealthProbe>,
    log_path: PathBuf,
    process: Option<ServerProcess>,
    cycle: Option<ActiveCycle>,
    cycle_id: u64,
    publisher: StatusPublisher,
    command_rx: mpsc::Receiver<SupervisorCommand>,
    report_tx: mpsc::Sender<PollReport>,
    report_rx: mpsc::Receiver<PollReport>,
}

impl SupervisorTask {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(report) = self.report_rx.recv() => self.handle_report(report),
            }
        }

        debug!("All supervisor handles dropped, stopping server");
        self.stop();
    }

    fn handle_command(&mut self, command: SupervisorCommand) {
        match command {
            SupervisorCommand::Start { ack } => {
                self.start();
                let _ = ack.send(());
            }
            SupervisorCommand::Stop { ack } => {
                self.stop();
                let _ = ack.send(());
            }
            SupervisorCommand::Pid { reply } => {
                let _ = reply.send(self.process.as_ref().map(ServerProcess::pid));
            }
        }
    }

    fn start(&mut self) {
        if self.cycle.is_some() {
            debug!("Start ignored: cycle {} still polling", self.cycle_id);
            return;
        }

        if self.publisher.current().is_running() {
            match self.process.as_mut().map(ServerProcess::has_exited) {
                Some(false) => {
                    debug!("Start ignored: server already running");
                    return;
                }
                _ => warn!("Server exited after reaching Running; starting a new cycle"),
            }
        }

        // Left over from a cycle that timed out, or exited on its own
        if let Some(stale) = self.process.take() {
            info!("Terminating server from previous cycle (PID {})", stale.pid());
            stale.terminate();
        }

        self.cycle_id += 1;
        let cycle = self.cycle_id;
        self.publisher.publish(cycle, ServerStatus::Starting);

        let process = match self.launch() {
            Ok(process) => process,
            Err(e) => {
                self.fail(cycle, &e);
                return;
            }
        };
        self.process = Some(process);

        let token = CancellationToken::new();
        self.cycle = Some(ActiveCycle {
            id: cycle,
            token: token.clone(),
        });

        let poll = self.poll;
        let probe = self.probe.clone();
        let report_tx = self.report_tx.clone();

        tokio::spawn(async move {
            let outcome = poll.run(probe.as_ref(), &token).await;
            // Owner may already be gone during teardown
            let _ = report_tx.send(PollReport { cycle, outcome }).await;
        });
    }

    fn launch(&self) -> SupervisorResult<ServerProcess> {
        let binary = self.locator.resolve()?;
        ServerProcess::spawn(&binary, &self.environment, &self.log_path)
    }

    fn handle_report(&mut self, report: PollReport) {
        let is_current = self
            .cycle
            .as_ref()
            .is_some_and(|c| c.id == report.cycle && !c.token.is_cancelled());

        if !is_current {
            debug!(
                "Discarding poll result {:?} from stale cycle {}",
                report.outcome, report.cycle
            );
            return;
        }

        self.cycle = None;

        match report.outcome {
            PollOutcome::Healthy { attempts } => {
                info!("Server healthy after {attempts} attempt(s)");
                self.publisher.publish(report.cycle, ServerStatus::Running);
            }
            PollOutcome::Exhausted { attempts } => {
                self.fail(report.cycle, &SupervisorError::health_timeout(attempts));
            }
            PollOutcome::Cancelled { attempts } => {
                debug!("Cycle {} cancelled after {attempts} attempt(s)", report.cycle);
            }
        }
    }

    fn fail(&mut self, cycle: u64, error: &SupervisorError) {
        error!("Start cycle {cycle} failed: {error}");

        let kind = error.kind().unwrap_or(FailureKind::Spawn);
        self.publisher.publish(
            cycle,
            ServerStatus::Failed {
                kind,
                reason: error.reason(),
            },
        );
    }

    fn stop(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            debug!("Cancelling poll cycle {}", cycle.id);
            cycle.token.cancel();
        }

        if let Some(process) = self.process.take() {
            process.terminate();
            info!("Server stopped");
        }

        if self.publisher.current() != ServerStatus::NotStarted {
            self.publisher.publish(self.cycle_id, ServerStatus::NotStarted);
        }
    }
}
