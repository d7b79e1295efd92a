//! The serial consume → parse → evaluate → dispatch loop.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use watchpost_queue::{parse_message, QueueConsumer, QueueError};
use watchpost_rules::{DispatchOutcome, RuleEngine};

use crate::sink::SpawningSink;

/// Counters for one run of the service loop.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub received: u64,
    pub rejected: u64,
    pub matched: u64,
    pub logged: u64,
    pub reported: u64,
    pub ignored: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        if outcome.matched > 0 {
            self.matched += 1;
        }
        self.logged += outcome.logged as u64;
        self.reported += outcome.reported as u64;
        if outcome.ignored {
            self.ignored += 1;
        }
    }
}

/// Consume messages until the source closes or `shutdown` is notified.
///
/// Messages are processed strictly one at a time. Malformed payloads are
/// logged and skipped. Pending side effects are awaited before returning,
/// bounded by the sink's drain timeout.
pub async fn run<C>(
    consumer: &mut C,
    engine: &mut RuleEngine,
    sink: &SpawningSink,
    shutdown: Arc<Notify>,
) -> Result<RunStats, QueueError>
where
    C: QueueConsumer + ?Sized,
{
    let shutdown_signal = shutdown.notified();
    tokio::pin!(shutdown_signal);
    shutdown_signal.as_mut().enable();

    info!(provider = consumer.provider(), "Consumer started");
    let mut stats = RunStats::default();

    let result = loop {
        let msg = tokio::select! {
            biased;
            _ = &mut shutdown_signal => {
                info!("Shutdown requested");
                break Ok(());
            }
            msg = consumer.recv() => msg,
        };

        let msg = match msg {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                info!("Message source closed");
                break Ok(());
            }
            Err(e) => break Err(e),
        };
        stats.received += 1;

        let event = match parse_message(&msg) {
            Ok(event) => event,
            Err(e) => {
                warn!(topic = %msg.topic, error = %e, "Dropping malformed message");
                stats.rejected += 1;
                continue;
            }
        };

        let outcome = engine.process(&event, sink);
        if outcome.matched == 0 {
            debug!(identifier = %event.identifier, "No rules matched");
        }
        stats.record(&outcome);
    };

    info!(in_flight = sink.in_flight(), "Waiting for pending side effects");
    sink.drain().await;
    info!(?stats, "Consumer stopped");
    result.map(|()| stats)
}
