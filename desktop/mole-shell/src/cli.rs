use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "mole-shell")]
#[command(about = "Run the Mole web server and report when it is ready")]
#[command(version)]
pub struct Cli {
    /// Directory holding config.toml (defaults to the platform config dir)
    #[arg(long)]
    pub(crate) config_dir: Option<PathBuf>,

    /// Server binary to launch instead of searching the usual locations
    #[arg(long)]
    pub(crate) binary: Option<PathBuf>,

    /// Port the server listens on
    #[arg(long)]
    pub(crate) port: Option<u16>,

    /// Print status transitions as JSON lines
    #[arg(long)]
    pub(crate) json: bool,

    /// Start again this many times after a failed start
    #[arg(long, default_value_t = 0)]
    pub(crate) retries: u32,
}
