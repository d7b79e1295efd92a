use std::path::PathBuf;

use clap::Parser;

/// Evaluate detection events from MQTT against the configured rules.
#[derive(Parser, Debug)]
#[command(name = "watchpost", version, about)]
pub struct Cli {
    /// Path to the JSON rule configuration.
    #[arg(long, env = "WATCHPOST_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Seconds between retention passes over the event table.
    #[arg(
        long,
        env = "WATCHPOST_RETENTION_INTERVAL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub retention_interval_secs: u64,

    /// Seconds to wait for in-flight logs and reports on shutdown.
    #[arg(
        long,
        env = "WATCHPOST_SHUTDOWN_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub shutdown_timeout_secs: u64,

    /// Validate the config, print a redacted summary and exit.
    #[arg(long)]
    pub check: bool,
}
