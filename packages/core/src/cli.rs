use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Detector cache CLI arguments
#[derive(Debug, Default, Parser)]
#[command(
    name = "detector-cache",
    version,
    about = "Self-refreshing cache of remote detection rules"
)]
pub struct Cli {
    /// Base URL of the remote rules service
    #[arg(long)]
    pub base_url: Option<String>,

    /// SQLite database holding the last fetched rules
    #[arg(long)]
    pub database_url: Option<String>,

    /// Refresh interval in seconds
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Address of the status server (/health, /metrics, /detectors)
    #[arg(long)]
    pub status_addr: Option<SocketAddr>,

    /// Run a single refresh cycle and exit
    #[arg(long, conflicts_with = "scan")]
    pub once: bool,

    /// Check a file against the stored detectors and exit (no network access,
    /// so RULES_BASE_URL is not required)
    #[arg(long, value_name = "FILE")]
    pub scan: Option<PathBuf>,
}
