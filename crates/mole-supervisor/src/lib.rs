//! Supervision of the local Mole web server.
//!
//! The desktop shells don't serve anything themselves: they launch the
//! separately built server binary, wait for its `/health` endpoint to
//! answer 200, and only then show its UI. [`ProcessSupervisor`] owns that
//! child process from launch to termination and exposes a small status
//! machine to whatever front end renders it:
//!
//! ```text
//! NotStarted -> Starting -> Running
//!                        -> Failed(reason) -> Starting (retry)
//! ```
//!
//! Once `Running`, the server is not monitored further; a server that
//! crashes later is only noticed by the front end, and the next `start()`
//! begins a fresh cycle.

mod config;
mod environment;
mod error;
mod health;
mod locator;
mod poll;
mod process;
mod status;
mod supervisor;

#[cfg(test)]
mod tests;

pub use config::{
    APP_DIR_NAME, BinarySettings, CONFIG_FILENAME, ENV_BINARY, ENV_CONFIG_DIR, ENV_PORT,
    ENV_TEMPLATES, HealthSettings, LogSinkSettings, ServerSettings, SupervisorConfig,
};
pub use environment::{
    ENV_SERVER_HOST, ENV_SERVER_NO_OPEN, ENV_SERVER_PORT, ENV_SERVER_TEMPLATES, ServerEnvironment,
};
pub use error::{Result, SupervisorError};
pub use health::{HealthProbe, HttpHealthProbe, ProbeOutcome};
pub use locator::{BinaryLocator, TemplateLocator};
pub use poll::{PollCycle, PollOutcome};
pub use process::ServerProcess;
pub use status::{FailureKind, ServerStatus, StatusChange};
pub use supervisor::ProcessSupervisor;

pub(crate) use status::StatusPublisher;
