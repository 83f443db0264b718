//! Kafka producer broker.

use async_trait::async_trait;
use fleetcast_events::{Envelope, Event, TOPIC_ID_HEADER_KEY};
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use tracing::{debug, info, instrument};

use super::config::KafkaConfig;
use crate::{base_envelope, encode_envelope, topic_id_from_header, Broker, BrokerError};

/// Broker producing envelopes to Kafka topics.
///
/// Envelope headers are copied to the record headers; the record value is
/// the encoded envelope.
pub struct KafkaBroker {
    producer: FutureProducer,
    config: KafkaConfig,
}

impl KafkaBroker {
    /// Create a broker. Unset topics are defaulted here, once.
    pub fn new(mut config: KafkaConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        config.topics.apply_defaults();

        let mut client_config = ClientConfig::new();

        client_config
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("security.protocol", config.security_protocol.as_str())
            .set(
                "message.timeout.ms",
                config.delivery_timeout.as_millis().to_string(),
            )
            .set("acks", "all");

        if let Some(credentials) = &config.credentials {
            client_config
                .set("sasl.mechanism", config.mechanism.as_str())
                .set("sasl.username", &credentials.key)
                .set("sasl.password", &credentials.secret);
        }

        let producer: FutureProducer =
            client_config
                .create()
                .map_err(|e| BrokerError::ConnectionFailed {
                    endpoint: config.bootstrap_servers.clone(),
                    cause: e.to_string(),
                })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            "Kafka broker created"
        );

        Ok(Self { producer, config })
    }

    #[must_use]
    pub fn config(&self) -> &KafkaConfig {
        &self.config
    }
}

#[async_trait]
impl Broker for KafkaBroker {
    fn name(&self) -> &'static str {
        "kafka"
    }

    fn build_envelope(&self, event: &Event) -> Result<Envelope, BrokerError> {
        let topic_id = self.config.topics.topic_for(event.source());
        Ok(base_envelope(event)?.with_header(TOPIC_ID_HEADER_KEY, topic_id))
    }

    #[instrument(skip_all, fields(broker = "kafka", event_type = ?envelope.event_type()))]
    async fn send_message(&self, envelope: Envelope) -> Result<(), BrokerError> {
        let topic_id = topic_id_from_header(&envelope)?;
        let payload = encode_envelope(&envelope)?;

        let headers = envelope
            .header
            .headers
            .iter()
            .fold(OwnedHeaders::new(), |headers, (key, value)| {
                headers.insert(Header {
                    key: key.as_str(),
                    value: Some(value.as_str()),
                })
            });

        debug!(
            topic_id = %topic_id,
            payload_size = payload.len(),
            "Publishing envelope"
        );

        let record: FutureRecord<'_, (), Vec<u8>> = FutureRecord::to(topic_id)
            .payload(&payload)
            .headers(headers);

        let (partition, offset) = self
            .producer
            .send(record, self.config.delivery_timeout)
            .await
            .map_err(|(err, _)| BrokerError::PublishFailed {
                topic: topic_id.to_string(),
                cause: err.to_string(),
            })?;

        info!(
            topic_id = %topic_id,
            message_id = %format!("{partition}:{offset}"),
            "Message published"
        );

        Ok(())
    }
}
