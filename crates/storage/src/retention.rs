//! Periodic deletion of events older than the configured retention.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::store::EventStore;

/// Shortest period accepted by [`spawn_retention_task`].
pub const MIN_RETENTION_INTERVAL: Duration = Duration::from_secs(1);

/// Purge everything older than `retain_days` before `now`.
///
/// A cutoff earlier than the representable calendar removes nothing.
pub async fn purge_expired(
    store: &dyn EventStore,
    retain_days: u32,
    now: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let Some(cutoff) = now.checked_sub_signed(chrono::Duration::days(i64::from(retain_days)))
    else {
        debug!(
            backend = store.backend_name(),
            retain_days, "Retention cutoff precedes the calendar, nothing to purge"
        );
        return Ok(0);
    };
    let removed = store.purge_older_than(cutoff).await?;
    if removed > 0 {
        info!(
            backend = store.backend_name(),
            removed,
            cutoff = %cutoff,
            "Purged expired events"
        );
    } else {
        debug!(backend = store.backend_name(), cutoff = %cutoff, "No expired events");
    }
    Ok(removed)
}

/// Run [`purge_expired`] every `interval` (first pass immediately) until
/// `shutdown` is notified. A `retain_days` of 0 disables purging.
///
/// Failures are logged and retried on the next tick. Intervals shorter
/// than [`MIN_RETENTION_INTERVAL`] are raised to it.
pub fn spawn_retention_task(
    store: Arc<dyn EventStore>,
    retain_days: u32,
    interval: Duration,
    shutdown: Arc<Notify>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if retain_days == 0 {
            info!("Event retention disabled (retainLogsForDays = 0)");
            return;
        }
        let interval = if interval < MIN_RETENTION_INTERVAL {
            warn!(
                requested_ms = interval.as_millis() as u64,
                "Retention interval too short, using {}s",
                MIN_RETENTION_INTERVAL.as_secs()
            );
            MIN_RETENTION_INTERVAL
        } else {
            interval
        };
        info!(
            retain_days,
            interval_secs = interval.as_secs(),
            "Event retention task started"
        );

        let shutdown_signal = shutdown.notified();
        tokio::pin!(shutdown_signal);
        shutdown_signal.as_mut().enable();

        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = purge_expired(store.as_ref(), retain_days, Utc::now()).await {
                        warn!(error = %e, "Event retention pass failed");
                    }
                }
                _ = &mut shutdown_signal => {
                    info!("Event retention task stopped");
                    break;
                }
            }
        }
    })
}
