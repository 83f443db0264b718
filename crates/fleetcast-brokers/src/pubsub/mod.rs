//! Topic-routed broker publishing to Pub/Sub.
//!
//! The destination topic is chosen from the event source when the envelope
//! is built and must exist before a message is published to it.

mod client;
pub mod config;

use async_trait::async_trait;
use fleetcast_events::{Envelope, Event, TOPIC_ID_HEADER_KEY};
use tracing::{info, instrument};

use crate::{base_envelope, encode_envelope, topic_id_from_header, Broker, BrokerError};

pub use client::PubSubClient;
pub use config::{PubSubConfig, DEFAULT_PUBSUB_ENDPOINT};

/// Header carrying the project id.
pub const PROJECT_ID_HEADER_KEY: &str = "project_id";

/// Broker publishing envelopes to Pub/Sub topics.
pub struct PubSubBroker {
    config: PubSubConfig,
    client: PubSubClient,
}

impl PubSubBroker {
    /// Create a broker. Unset topics are defaulted here, once.
    pub fn new(mut config: PubSubConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        config.topics.apply_defaults();

        let client = PubSubClient::new(
            &config.endpoint,
            &config.project_id,
            config.access_token.clone(),
        )?;

        info!(
            project_id = %config.project_id,
            endpoint = %config.endpoint,
            "Pub/Sub broker created"
        );

        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &PubSubConfig {
        &self.config
    }
}

#[async_trait]
impl Broker for PubSubBroker {
    fn name(&self) -> &'static str {
        "pubsub"
    }

    fn build_envelope(&self, event: &Event) -> Result<Envelope, BrokerError> {
        let topic_id = self.config.topics.topic_for(event.source());

        Ok(base_envelope(event)?
            .with_header(PROJECT_ID_HEADER_KEY, self.config.project_id.as_str())
            .with_header(TOPIC_ID_HEADER_KEY, topic_id))
    }

    #[instrument(skip_all, fields(broker = "pubsub", event_type = ?envelope.event_type()))]
    async fn send_message(&self, envelope: Envelope) -> Result<(), BrokerError> {
        let topic_id = topic_id_from_header(&envelope)?;

        if !self.client.topic_exists(topic_id).await? {
            return Err(BrokerError::TopicNotFound {
                topic: topic_id.to_string(),
                scope: format!("projectID {}", self.config.project_id),
            });
        }

        let data = encode_envelope(&envelope)?;
        let message_id = self
            .client
            .publish(topic_id, &data, &envelope.header.headers)
            .await?;

        info!(topic_id = %topic_id, message_id = %message_id, "Message published");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::TopicConfig;
    use fleetcast_events::resources::{gameserver, GameServer};
    use fleetcast_events::{Message, EVENT_TYPE_HEADER_KEY};
    use std::collections::BTreeMap;

    const PROJECT_ID: &str = "calm-weather-345673";

    fn message() -> Message {
        Message::object(GameServer::new("default", "gs-1"))
    }

    #[test]
    fn test_build_envelope_for_gameserver_events() {
        let broker = PubSubBroker::new(PubSubConfig::new(PROJECT_ID)).unwrap();

        let cases = [
            (gameserver::added(message()), "gameserver.events.added"),
            (gameserver::updated(message()), "gameserver.events.updated"),
            (gameserver::deleted(message()), "gameserver.events.deleted"),
        ];

        for (event, event_type) in cases {
            let envelope = broker.build_envelope(&event).unwrap();

            let expected: BTreeMap<String, String> = [
                (PROJECT_ID_HEADER_KEY, PROJECT_ID),
                (EVENT_TYPE_HEADER_KEY, event_type),
                (TOPIC_ID_HEADER_KEY, "gameserver.events"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

            assert_eq!(envelope.header.headers, expected);
            assert_eq!(envelope.message["name"], "gs-1");
        }
    }

    #[test]
    fn test_build_envelope_uses_per_source_topic() {
        let config = PubSubConfig::new(PROJECT_ID)
            .with_topics(TopicConfig::default().with_on_add("custom.added"));
        let broker = PubSubBroker::new(config).unwrap();

        let added = broker
            .build_envelope(&gameserver::added(message()))
            .unwrap();
        let updated = broker
            .build_envelope(&gameserver::updated(message()))
            .unwrap();

        assert_eq!(added.topic_id(), Some("custom.added"));
        assert_eq!(updated.topic_id(), Some("gameserver.events"));
    }

    #[test]
    fn test_defaults_applied_at_construction() {
        let broker = PubSubBroker::new(PubSubConfig::new(PROJECT_ID)).unwrap();
        let topics = &broker.config().topics;

        assert_eq!(topics.generic_topic_id, "gameserver.events");
        assert_eq!(topics.on_add_topic_id, "gameserver.events");
        assert_eq!(topics.on_update_topic_id, "gameserver.events");
        assert_eq!(topics.on_delete_topic_id, "gameserver.events");
    }
}
