//! Logging setup with file rotation.

use std::path::{Path, PathBuf};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_PREFIX: &str = "mole-shell";
const LOG_SUFFIX: &str = "log";
const DEFAULT_FILTER: &str = "info,mole_supervisor=debug";

/// Setup logging with console and, when `support_dir` is given, rotating file output.
///
/// # Log Layers
/// - Console: human-readable, on stderr so stdout stays free for status output
/// - File: plain text under `<support_dir>/logs`, daily rotation, 7 files kept
pub fn setup_logging(support_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match support_dir {
        Some(dir) => {
            let logs_dir = dir.join("logs");
            std::fs::create_dir_all(&logs_dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(7)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix(LOG_SUFFIX)
                .build(&logs_dir)?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(file_appender),
            )
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stderr);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Path of today's shell log file.
pub fn current_log_path(support_dir: &Path) -> PathBuf {
    // The appender names files by UTC date
    let today = chrono::Utc::now().format("%Y-%m-%d");
    support_dir
        .join("logs")
        .join(format!("{LOG_PREFIX}.{today}.{LOG_SUFFIX}"))
}
