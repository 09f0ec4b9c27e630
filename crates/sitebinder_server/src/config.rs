use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Convert a website into a single downloadable PDF.
#[derive(Debug, Parser)]
#[command(name = "sitebinder", version, about)]
pub struct Cli {
    /// Address the HTTP server binds to.
    #[arg(long, default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory holding per-request session folders.
    #[arg(long, default_value = "sessions")]
    pub sessions_dir: PathBuf,

    /// Seconds an unacknowledged session may live before the janitor
    /// removes it.
    #[arg(long, default_value_t = 300)]
    pub session_max_age_secs: u64,

    /// Seconds between janitor sweeps.
    #[arg(long, default_value_t = 30)]
    pub sweep_interval_secs: u64,

    /// Also write logs to ./sitebinder.log.
    #[arg(long)]
    pub log_file: bool,
}
