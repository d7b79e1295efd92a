//! Fans a notification out to every configured channel.
//!
//! Individual channel failures don't block other channels.

use crate::traits::{DispatchResult, Notification, Notifier};

/// Dispatches notifications to a fixed set of channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Create a dispatcher with no channels; every dispatch is a no-op.
    pub fn empty() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver `notification` to all channels, one after another.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            tracing::debug!("No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.channel_name(),
                        title = %notification.title,
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::traits::NotifyError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    pub(crate) struct MockNotifier {
        pub name: String,
        pub sent: Arc<Mutex<Vec<Notification>>>,
        pub should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    fn notification() -> Notification {
        Notification {
            title: "test".to_string(),
            message: "test body".to_string(),
            priority: 5,
        }
    }

    #[tokio::test]
    async fn dispatch_to_all_channels() {
        let sent_a = Arc::new(Mutex::new(Vec::new()));
        let sent_b = Arc::new(Mutex::new(Vec::new()));

        let dispatcher = Dispatcher::new(vec![
            Box::new(MockNotifier {
                name: "a".to_string(),
                sent: sent_a.clone(),
                should_fail: false,
            }),
            Box::new(MockNotifier {
                name: "b".to_string(),
                sent: sent_b.clone(),
                should_fail: false,
            }),
        ]);

        let results = dispatcher.dispatch(&notification()).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(sent_a.lock().unwrap().len(), 1);
        assert_eq!(sent_b.lock().unwrap()[0], notification());
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let attempts = Arc::new(AtomicUsize::new(0));

        struct Failing(Arc<AtomicUsize>);

        #[async_trait::async_trait]
        impl Notifier for Failing {
            async fn send(&self, _n: &Notification) -> Result<(), NotifyError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(NotifyError::Status {
                    status: 503,
                    body: "down".to_string(),
                })
            }
            fn channel_name(&self) -> &str {
                "fail"
            }
        }

        let dispatcher = Dispatcher::new(vec![
            Box::new(Failing(attempts.clone())),
            Box::new(MockNotifier {
                name: "ok".to_string(),
                sent: sent.clone(),
                should_fail: false,
            }),
        ]);

        let results = dispatcher.dispatch(&notification()).await;
        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("Endpoint returned 503: down"));
        assert!(results[1].success);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_dispatcher_returns_nothing() {
        let dispatcher = Dispatcher::empty();
        assert!(dispatcher.is_empty());
        assert!(dispatcher.dispatch(&notification()).await.is_empty());
    }
}
