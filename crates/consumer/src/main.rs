use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Notify;
use tracing::{info, warn};

use watchpost_consumer::{run, Cli, SpawningSink};
use watchpost_core::config::load_dotenv;
use watchpost_core::{Config, ConfigError};
use watchpost_notify::EventReporter;
use watchpost_queue::MqttConsumer;
use watchpost_rules::RuleEngine;
use watchpost_storage::{spawn_retention_task, EventStore, MySqlEventStore};

fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    let loaded = match Config::load(&cli.config) {
        Ok(loaded) => loaded,
        Err(ConfigError::Invalid(errors)) => {
            eprintln!("Invalid config {}:", cli.config.display());
            for error in &errors {
                eprintln!("  {error}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load {}", cli.config.display()))
        }
    };

    init_tracing(loaded.config.debug);
    for warning in &loaded.warnings {
        warn!("config: {warning}");
    }

    if cli.check {
        println!("{}", serde_json::to_string_pretty(&loaded.config.redacted_summary())?);
        return Ok(());
    }

    let config = Arc::new(loaded.config);
    config.log_summary();

    let store: Arc<dyn EventStore> = Arc::new(
        MySqlEventStore::connect(&config.db)
            .await
            .context("failed to connect to database")?,
    );

    let reporter = match &config.report_server {
        Some(settings) => Some(Arc::new(
            EventReporter::from_settings(settings).context("invalid reportServer settings")?,
        )),
        None => {
            info!("No reportServer configured, report actions will not notify");
            None
        }
    };

    let shutdown = Arc::new(Notify::new());
    let retention = spawn_retention_task(
        store.clone(),
        config.retain_logs_for_days,
        Duration::from_secs(cli.retention_interval_secs),
        shutdown.clone(),
    );

    let topics = config.identifiers().into_iter().map(String::from).collect();
    let mut consumer = MqttConsumer::new(&config.mqtt, topics)?;
    let sink = SpawningSink::new(store, reporter)
        .with_drain_timeout(Duration::from_secs(cli.shutdown_timeout_secs));
    let mut engine = RuleEngine::new(config.clone());

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            signal.notify_waiters();
        }
    });

    info!("watchpost starting");
    let stats = run(&mut consumer, &mut engine, &sink, shutdown.clone()).await?;

    shutdown.notify_waiters();
    if let Err(e) = retention.await {
        warn!(error = %e, "Retention task ended abnormally");
    }
    info!(
        received = stats.received,
        logged = stats.logged,
        reported = stats.reported,
        "watchpost exited cleanly"
    );
    Ok(())
}
