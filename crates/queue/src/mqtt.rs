//! MQTT consumer built on rumqttc.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter, Transport,
};
use tracing::{debug, info, warn};
use url::Url;

use watchpost_core::config::MqttSettings;

use crate::consumer::{QueueConsumer, QueueMessage};
use crate::error::QueueError;

const DEFAULT_PORT: u16 = 1883;
const DEFAULT_TLS_PORT: u16 = 8883;
const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Subscribes to a fixed set of topics and yields every publish.
pub struct MqttConsumer {
    client: AsyncClient,
    eventloop: EventLoop,
    topics: Vec<String>,
}

impl MqttConsumer {
    /// Prepare a consumer for `settings.host`. No network I/O happens until
    /// the first [`QueueConsumer::recv`].
    pub fn new(settings: &MqttSettings, topics: Vec<String>) -> Result<Self, QueueError> {
        let options = broker_options(&settings.host, &settings.client_id)?;
        let (host, port) = options.broker_address();
        info!(host = %host, port, topics = topics.len(), "MQTT consumer configured");

        let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        Ok(Self {
            client,
            eventloop,
            topics,
        })
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Queue a single SUBSCRIBE request covering every topic.
    fn subscribe_all(&self) -> Result<(), QueueError> {
        if self.topics.is_empty() {
            debug!("No topics to subscribe to");
            return Ok(());
        }
        debug!(topics = ?self.topics, "Subscribing");
        let filters = self
            .topics
            .iter()
            .map(|topic| SubscribeFilter::new(topic.clone(), QoS::AtMostOnce));
        self.client
            .try_subscribe_many(filters)
            .map_err(|e| QueueError::Subscribe(format!("{} topics: {e}", self.topics.len())))
    }
}

#[async_trait]
impl QueueConsumer for MqttConsumer {
    async fn recv(&mut self) -> Result<Option<QueueMessage>, QueueError> {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to MQTT broker");
                    // A fresh session has no subscriptions.
                    self.subscribe_all()?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        topic = %publish.topic,
                        bytes = publish.payload.len(),
                        "Received MQTT message"
                    );
                    return Ok(Some(QueueMessage::new(
                        publish.topic,
                        publish.payload.to_vec(),
                    )));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_in_secs = RECONNECT_DELAY.as_secs(),
                        "MQTT connection error"
                    );
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    }

    fn provider(&self) -> &str {
        "mqtt"
    }
}

/// Build client options from a broker URL such as `mqtt://broker:1883`.
///
/// `mqtts://` and `ssl://` enable TLS; credentials in the URL are passed
/// to the broker.
pub fn broker_options(host: &str, client_id: &str) -> Result<MqttOptions, QueueError> {
    let url = Url::parse(host).map_err(|e| QueueError::InvalidUrl(format!("{host}: {e}")))?;

    let tls = match url.scheme() {
        "mqtt" | "tcp" => false,
        "mqtts" | "ssl" => true,
        other => {
            return Err(QueueError::InvalidUrl(format!(
                "{host}: unsupported scheme '{other}'"
            )))
        }
    };

    let broker = url
        .host_str()
        .ok_or_else(|| QueueError::InvalidUrl(format!("{host}: missing host")))?;
    let port = url
        .port()
        .unwrap_or(if tls { DEFAULT_TLS_PORT } else { DEFAULT_PORT });

    let mut options = MqttOptions::new(client_id, broker, port);
    options.set_keep_alive(KEEP_ALIVE);
    if tls {
        options.set_transport(Transport::tls_with_default_config());
    }
    if !url.username().is_empty() {
        options.set_credentials(url.username(), url.password().unwrap_or_default());
    }
    Ok(options)
}
