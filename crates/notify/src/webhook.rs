//! Gotify-compatible HTTP webhook notifier.
//!
//! Posts `{title, message, priority}` as JSON to `{host}/message`,
//! authenticating with the `X-Gotify-Key` header.

use std::time::Duration;

use watchpost_core::config::{resolve_env_vars, ReportServerSettings};

use crate::traits::{Notification, Notifier, NotifyError};

const API_KEY_HEADER: &str = "X-Gotify-Key";

/// Upper bound on one delivery, connect included.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers notifications as JSON over HTTP to a push server.
#[derive(Debug)]
pub struct WebhookNotifier {
    /// Full target URL (`{host}/message`).
    url: String,
    api_key: String,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier for `host`, e.g. `https://push.example.com`.
    pub fn new(host: &str, api_key: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_timeout(host, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Like [`WebhookNotifier::new`] with a custom per-request timeout.
    pub fn with_timeout(
        host: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            url: format!("{}/message", host.trim_end_matches('/')),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build from config, resolving `${VAR}` references in host and key.
    pub fn from_settings(settings: &ReportServerSettings) -> Result<Self, NotifyError> {
        let host = resolve_env_vars(&settings.host)
            .map_err(|e| NotifyError::Config(e.to_string()))?;
        let api_key = resolve_env_vars(&settings.api_key)
            .map_err(|e| NotifyError::Config(e.to_string()))?;
        Self::new(&host, api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(notification)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(url = %self.url, %status, "webhook notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(host: &str, api_key: &str) -> ReportServerSettings {
        ReportServerSettings {
            host: host.to_string(),
            api_key: api_key.to_string(),
            priority: 5,
            title_template: None,
            message_template: None,
        }
    }

    #[test]
    fn url_appends_message_path() {
        assert_eq!(
            WebhookNotifier::new("https://push.local", "k").unwrap().url(),
            "https://push.local/message"
        );
        assert_eq!(
            WebhookNotifier::new("https://push.local/", "k").unwrap().url(),
            "https://push.local/message"
        );
    }

    #[test]
    fn from_settings_resolves_env() {
        std::env::set_var("WP_WEBHOOK_TEST_HOST", "push.example.com");
        std::env::set_var("WP_WEBHOOK_TEST_KEY", "secret-key-123");
        let notifier = WebhookNotifier::from_settings(&settings(
            "https://${WP_WEBHOOK_TEST_HOST}",
            "${WP_WEBHOOK_TEST_KEY}",
        ))
        .unwrap();
        assert_eq!(notifier.url(), "https://push.example.com/message");
        assert_eq!(notifier.api_key, "secret-key-123");
        std::env::remove_var("WP_WEBHOOK_TEST_HOST");
        std::env::remove_var("WP_WEBHOOK_TEST_KEY");
    }

    #[test]
    fn from_settings_missing_env() {
        let result = WebhookNotifier::from_settings(&settings(
            "https://push.local",
            "${ABSOLUTELY_NOT_SET_12345}",
        ));
        match result {
            Err(NotifyError::Config(msg)) => assert!(msg.contains("ABSOLUTELY_NOT_SET_12345")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn channel_name_is_webhook() {
        assert_eq!(
            WebhookNotifier::new("https://x", "k").unwrap().channel_name(),
            "webhook"
        );
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let notifier = WebhookNotifier::with_timeout(
            &format!("http://{addr}"),
            "k",
            Duration::from_millis(200),
        )
        .unwrap();
        let notification = Notification {
            title: "t".to_string(),
            message: "m".to_string(),
            priority: 1,
        };

        let result = tokio::time::timeout(Duration::from_secs(5), notifier.send(&notification))
            .await
            .expect("send was not bounded by the request timeout");
        match result {
            Err(NotifyError::Http(e)) => assert!(e.is_timeout(), "unexpected error: {e}"),
            other => panic!("expected timeout, got: {other:?}"),
        }
        server.abort();
    }
}
