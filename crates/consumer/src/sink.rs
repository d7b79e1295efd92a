//! Fire-and-forget side effects for dispatched rules.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use watchpost_core::event::DetectionEvent;
use watchpost_notify::EventReporter;
use watchpost_rules::ActionSink;
use watchpost_storage::EventStore;

/// Runs each log/report request on its own tokio task so the event loop
/// never waits on the database or the push server.
///
/// Failures are logged and dropped. Must be used from within a tokio runtime.
pub struct SpawningSink {
    store: Arc<dyn EventStore>,
    reporter: Option<Arc<EventReporter>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    drain_timeout: Duration,
}

/// How long [`SpawningSink::drain`] waits unless told otherwise.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

impl SpawningSink {
    pub fn new(store: Arc<dyn EventStore>, reporter: Option<Arc<EventReporter>>) -> Self {
        Self {
            store,
            reporter,
            pending: Mutex::new(Vec::new()),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    /// Number of side effects still running.
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .map(|p| p.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    /// Wait for spawned side effects to finish, at most the drain timeout
    /// in total. Tasks still running at the deadline are aborted.
    ///
    /// Returns the number of aborted tasks.
    pub async fn drain(&self) -> usize {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return 0,
        };
        let deadline = tokio::time::Instant::now() + self.drain_timeout;
        let mut aborted = 0;
        for mut handle in handles {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Side-effect task panicked"),
                Err(_) => {
                    handle.abort();
                    aborted += 1;
                }
            }
        }
        if aborted > 0 {
            warn!(
                aborted,
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "Abandoned side effects still running at shutdown"
            );
        }
        aborted
    }
}

impl ActionSink for SpawningSink {
    fn log_event(&self, event: &DetectionEvent) {
        let store = self.store.clone();
        let event = event.clone();
        self.track(tokio::spawn(async move {
            match store.log_event(&event).await {
                Ok(()) => debug!(
                    backend = store.backend_name(),
                    identifier = %event.identifier,
                    label = %event.label,
                    "Event logged"
                ),
                Err(e) => warn!(
                    backend = store.backend_name(),
                    identifier = %event.identifier,
                    error = %e,
                    "Failed to log event"
                ),
            }
        }));
    }

    fn report_event(&self, event: &DetectionEvent) {
        let Some(reporter) = self.reporter.clone() else {
            debug!(
                identifier = %event.identifier,
                label = %event.label,
                "Report requested but no reportServer is configured"
            );
            return;
        };
        let event = event.clone();
        self.track(tokio::spawn(async move {
            match reporter.report(&event).await {
                Ok(results) => {
                    let failed = results.iter().filter(|r| !r.success).count();
                    debug!(
                        identifier = %event.identifier,
                        channels = results.len(),
                        failed,
                        "Event reported"
                    );
                }
                Err(e) => warn!(
                    identifier = %event.identifier,
                    error = %e,
                    "Failed to render report"
                ),
            }
        }));
    }
}
