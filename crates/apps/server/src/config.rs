use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_RESULTS_PATH: &str = "data/results.json";

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Mean, median and mode over HTTP")]
pub struct Args {
    /// Listen address (default: STATS_ADDR or 127.0.0.1:3000)
    #[arg(long)]
    pub addr: Option<String>,

    /// JSON file that saved results are appended to
    /// (default: STATS_RESULTS_PATH or data/results.json)
    #[arg(long)]
    pub results_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub results_path: PathBuf,
}

impl ServerConfig {
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(
        args: Args,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        let addr = args
            .addr
            .or_else(|| env("STATS_ADDR"))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("invalid listen address {addr:?}: {e}"))?;

        let results_path = args
            .results_path
            .or_else(|| env("STATS_RESULTS_PATH").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_PATH));

        Ok(Self { addr, results_path })
    }

    pub fn from_env(args: Args) -> Result<Self, String> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }
}
