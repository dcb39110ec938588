//! mole-shell - headless front end for the Mole web server
//!
//! Launches the server through [`ProcessSupervisor`], reports each status
//! transition, and stops the server on SIGINT/SIGTERM.
//!
//! # Examples
//!
//! ```bash
//! # Launch with the default config and search locations
//! mole-shell
//!
//! # Explicit binary, JSON status lines, two retries after a failed start
//! mole-shell --binary ./bin/web-go --json --retries 2
//! ```

mod cli;
mod logging;
mod signals;
mod status_view;


use crate::{
    cli::Cli,
    logging::{current_log_path, setup_logging},
    signals::shutdown_signal,
    status_view::{StatusView, build_status_view},
};

use mole_supervisor::{
    ProcessSupervisor, Result as SupervisorResult, StatusChange, SupervisorConfig,
};

use std::process::ExitCode;

use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging();

    info!("Starting mole-shell v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", e.reason());
            return ExitCode::FAILURE;
        }
    };
    config.log_summary();

    let supervisor = match ProcessSupervisor::new(config) {
        Ok(supervisor) => supervisor,
        Err(e) => {
            error!("Failed to create supervisor: {e}");
            eprintln!("{}", e.reason());
            return ExitCode::FAILURE;
        }
    };

    let mut shutdown = match shutdown_signal() {
        Ok(rx) => rx,
        Err(e) => {
            error!("Failed to register signal handlers: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut changes = supervisor.changes();
    let mut retries_left = cli.retries;
    supervisor.start().await;

    loop {
        tokio::select! {
            sig = &mut shutdown => {
                match sig {
                    Ok(sig) => info!("Stopping server on signal {sig}"),
                    Err(_) => warn!("Signal listener exited, stopping server"),
                }
                supervisor.stop().await;
                return ExitCode::SUCCESS;
            }
            change = changes.recv() => match change {
                Ok(change) => {
                    report(&supervisor, &change, cli.json).await;

                    if !change.status.is_failed() {
                        continue;
                    }

                    if retries_left == 0 {
                        supervisor.stop().await;
                        return ExitCode::FAILURE;
                    }

                    retries_left -= 1;
                    info!("Retrying start ({retries_left} retries left)");
                    supervisor.start().await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} status changes");
                }
                Err(RecvError::Closed) => {
                    error!("Supervisor status channel closed");
                    return ExitCode::FAILURE;
                }
            },
        }
    }
}

fn init_logging() {
    let support_dir = match SupervisorConfig::support_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{e}; logging to console only");
            let _ = setup_logging(None);
            return;
        }
    };

    match setup_logging(Some(&support_dir)) {
        Ok(()) => info!("Shell log: {}", current_log_path(&support_dir).display()),
        Err(e) => {
            eprintln!("Cannot write logs under {}: {e}", support_dir.display());
            let _ = setup_logging(None);
        }
    }
}

/// Config file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> SupervisorResult<SupervisorConfig> {
    let mut config = match cli.config_dir {
        Some(ref dir) => SupervisorConfig::load_from(dir)?,
        None => SupervisorConfig::load()?,
    };

    if let Some(ref binary) = cli.binary {
        config.binary.path = Some(binary.clone());
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config.validate()?;
    Ok(config)
}

async fn report(supervisor: &ProcessSupervisor, change: &StatusChange, json: bool) {
    let pid = supervisor.pid().await;
    let view = build_status_view(change, &supervisor.server_url(), pid);
    print_view(&view, json);
}

fn print_view(view: &StatusView, json: bool) {
    if !json {
        println!("{}", view.render_text());
        return;
    }

    match serde_json::to_string(view) {
        Ok(line) => println!("{line}"),
        Err(e) => error!("Failed to serialize status: {e}"),
    }
}
