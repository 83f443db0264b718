//! Streaming broker publishing to Kafka.
//!
//! Configuration is always available; the producer itself needs the
//! `kafka` feature.

pub mod config;
#[cfg(feature = "kafka")]
mod producer;

pub use config::{
    ApiCredentials, KafkaConfig, SaslMechanism, SecurityProtocol, DEFAULT_CLIENT_ID,
    DEFAULT_DELIVERY_TIMEOUT,
};
#[cfg(feature = "kafka")]
pub use producer::KafkaBroker;
