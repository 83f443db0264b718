//! # fleetcast-brokers
//!
//! Broker abstraction and transport adapters.
//!
//! A [`Broker`] turns an [`Event`] into an [`Envelope`] and delivers it.
//! Adapters:
//!
//! - [`stdout::StdoutBroker`]: logs the encoded envelope, never fails
//! - [`pubsub::PubSubBroker`]: topic-routed publish over the Pub/Sub REST API
//! - `kafka::KafkaBroker`: credentialed streaming producer (`kafka` feature)
//! - [`http::HttpBroker`]: in-memory index of ready game servers served over HTTP
//!
//! ## Cargo Features
//!
//! - `kafka`: Enable the Kafka adapter (requires librdkafka)

pub mod error;
pub mod http;
pub mod kafka;
pub mod pubsub;
pub mod stdout;
pub mod topics;

use async_trait::async_trait;
use fleetcast_events::{Envelope, Event, EventError};

pub use error::BrokerError;
pub use topics::{TopicConfig, DEFAULT_TOPIC_ID};

/// Transport used by the broadcaster to publish events.
///
/// Implementations may be invoked concurrently and are responsible for
/// locking any state of their own.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Build the envelope for `event`. Every broker sets at least the
    /// `event_type` header.
    fn build_envelope(&self, event: &Event) -> Result<Envelope, BrokerError>;

    /// Deliver `envelope`, resolving once the transport acknowledged it.
    async fn send_message(&self, envelope: Envelope) -> Result<(), BrokerError>;
}

/// Envelope with the event's content as message and its `event_type` header set.
pub fn base_envelope(event: &Event) -> Result<Envelope, BrokerError> {
    let envelope = Envelope::from_event(event).map_err(|e| BrokerError::EnvelopeBuild {
        event_type: event.event_type().to_string(),
        cause: e.to_string(),
    })?;

    Ok(envelope.with_header(
        fleetcast_events::EVENT_TYPE_HEADER_KEY,
        event.event_type().as_str(),
    ))
}

/// Routing key of a topic-routed envelope.
pub fn topic_id_from_header(envelope: &Envelope) -> Result<&str, BrokerError> {
    envelope.topic_id().ok_or(BrokerError::MissingTopicId)
}

pub(crate) fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, BrokerError> {
    envelope.encode().map_err(|e: EventError| BrokerError::Encode {
        cause: e.to_string(),
    })
}
