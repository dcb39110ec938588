//! Owned handle to the server child process.

use crate::{Result as SupervisorResult, ServerEnvironment, SupervisorError};

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// The launched server.
///
/// Acquired by [`ServerProcess::spawn`], released by [`ServerProcess::terminate`].
/// Dropping a handle that was never terminated terminates it, so a handle
/// can't outlive its owner on any path.
pub struct ServerProcess {
    pid: u32,
    binary: PathBuf,
    child: Option<Child>,
}

impl ServerProcess {
    /// Spawn `binary` with the environment overlay, output appended to `log_path`.
    ///
    /// A log file that can't be opened doesn't block the launch; output is
    /// discarded instead.
    pub fn spawn(
        binary: &Path,
        environment: &ServerEnvironment,
        log_path: &Path,
    ) -> SupervisorResult<Self> {
        let mut cmd = Command::new(binary);

        for (key, value) in environment.iter() {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());

        match open_log_sink(log_path) {
            Ok((stdout, stderr)) => {
                cmd.stdout(stdout).stderr(stderr);
            }
            Err(e) => {
                warn!(
                    "Cannot open server log {}: {e}; discarding server output",
                    log_path.display()
                );
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        let child = cmd
            .spawn()
            .map_err(|e| SupervisorError::process_spawn(binary.to_path_buf(), e))?;

        let pid = child.id().unwrap_or_default();
        info!("Spawned {} with PID {pid}", binary.display());

        Ok(Self {
            pid,
            binary: binary.to_path_buf(),
            child: Some(child),
        })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The child has exited on its own (reaps it if so).
    pub fn has_exited(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return true;
        };

        match child.try_wait() {
            Ok(Some(status)) => {
                info!("Server process {} exited ({status})", self.pid);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Cannot query server process {}: {e}", self.pid);
                false
            }
        }
    }

    /// Ask the server to exit and release the handle without waiting.
    pub fn terminate(mut self) {
        self.signal_terminate();
    }

    fn signal_terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("Server process {} already exited ({status})", self.pid);
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            match i32::try_from(self.pid) {
                Ok(raw) => {
                    info!("Sending SIGTERM to pid {}", self.pid);
                    if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
                        warn!("Failed to signal pid {}: {e}", self.pid);
                    }
                }
                Err(_) => warn!("PID {} out of range, cannot signal", self.pid),
            }
        }

        #[cfg(not(unix))]
        {
            info!("Killing server process {}", self.pid);
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill pid {}: {e}", self.pid);
            }
        }

        // Runtime reaps the child once it exits
        drop(child);
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        self.signal_terminate();
    }
}

impl std::fmt::Debug for ServerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerProcess")
            .field("pid", &self.pid)
            .field("binary", &self.binary)
            .field("owned", &self.child.is_some())
            .finish()
    }
}

/// Append-mode log file, one handle for stdout and a clone for stderr.
fn open_log_sink(log_path: &Path) -> std::io::Result<(File, File)> {
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let stdout = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let stderr = stdout.try_clone()?;

    Ok((stdout, stderr))
}
