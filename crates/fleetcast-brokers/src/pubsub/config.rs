//! Pub/Sub broker configuration.

use std::env;

use crate::error::BrokerError;
use crate::topics::TopicConfig;

/// Public Pub/Sub REST endpoint.
pub const DEFAULT_PUBSUB_ENDPOINT: &str = "https://pubsub.googleapis.com";

/// Pub/Sub connection and routing configuration.
#[derive(Debug, Clone)]
pub struct PubSubConfig {
    /// Cloud project owning the topics.
    pub project_id: String,
    /// Topic selection per event source.
    pub topics: TopicConfig,
    /// REST endpoint base URL.
    pub endpoint: String,
    /// OAuth2 bearer token. Not needed against the emulator.
    pub access_token: Option<String>,
}

impl PubSubConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            topics: TopicConfig::default(),
            endpoint: DEFAULT_PUBSUB_ENDPOINT.to_string(),
            access_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `PUBSUB_PROJECT_ID`: project owning the topics
    ///
    /// Optional:
    /// - `PUBSUB_ENDPOINT`: REST endpoint (default: `https://pubsub.googleapis.com`)
    /// - `PUBSUB_EMULATOR_HOST`: `host:port` of a local emulator, overrides the endpoint
    /// - `PUBSUB_ACCESS_TOKEN`: bearer token sent with every request
    /// - topic variables read by [`TopicConfig::from_env`]
    pub fn from_env() -> Result<Self, BrokerError> {
        let project_id = env::var("PUBSUB_PROJECT_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BrokerError::ConfigMissing {
                var: "PUBSUB_PROJECT_ID".to_string(),
            })?;

        let endpoint = match env::var("PUBSUB_EMULATOR_HOST") {
            Ok(host) if !host.is_empty() => format!("http://{host}"),
            _ => env::var("PUBSUB_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_PUBSUB_ENDPOINT.to_string()),
        };

        Ok(Self {
            project_id,
            topics: TopicConfig::from_env(),
            endpoint,
            access_token: env::var("PUBSUB_ACCESS_TOKEN").ok().filter(|v| !v.is_empty()),
        })
    }

    #[must_use]
    pub fn with_topics(mut self, topics: TopicConfig) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BrokerError> {
        if self.project_id.is_empty() {
            return Err(BrokerError::ConfigMissing {
                var: "project_id".to_string(),
            });
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(BrokerError::ConfigInvalid {
                var: "endpoint".to_string(),
                reason: format!("{} is not an http(s) URL", self.endpoint),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::ScopedEnv;

    #[test]
    fn test_new_uses_public_endpoint() {
        let config = PubSubConfig::new("calm-weather-345673");
        assert_eq!(config.endpoint, DEFAULT_PUBSUB_ENDPOINT);
        assert!(config.access_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_project() {
        let err = PubSubConfig::new("").validate().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let err = PubSubConfig::new("p")
            .with_endpoint("localhost:8085")
            .validate()
            .unwrap_err();
        assert!(matches!(err, BrokerError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_from_env_missing_project() {
        let _env = ScopedEnv::with(&[("PUBSUB_EMULATOR_HOST", "localhost:8085")]);

        match PubSubConfig::from_env() {
            Err(BrokerError::ConfigMissing { var }) => assert_eq!(var, "PUBSUB_PROJECT_ID"),
            other => panic!("Expected ConfigMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_from_env_defaults() {
        let _env = ScopedEnv::with(&[("PUBSUB_PROJECT_ID", "calm-weather-345673")]);

        let config = PubSubConfig::from_env().unwrap();

        assert_eq!(config.project_id, "calm-weather-345673");
        assert_eq!(config.endpoint, DEFAULT_PUBSUB_ENDPOINT);
        assert!(config.access_token.is_none());
        assert_eq!(config.topics, TopicConfig::default());
    }

    #[test]
    fn test_from_env_emulator_host_overrides_endpoint() {
        let _env = ScopedEnv::with(&[
            ("PUBSUB_PROJECT_ID", "local"),
            ("PUBSUB_ENDPOINT", "https://pubsub.example.com"),
            ("PUBSUB_EMULATOR_HOST", "localhost:8085"),
            ("PUBSUB_ACCESS_TOKEN", "ya29.token"),
            ("FLEETCAST_TOPIC_ID", "gs.all"),
        ]);

        let config = PubSubConfig::from_env().unwrap();

        assert_eq!(config.endpoint, "http://localhost:8085");
        assert_eq!(config.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.topics.generic_topic_id, "gs.all");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_env_endpoint_without_emulator() {
        let _env = ScopedEnv::with(&[
            ("PUBSUB_PROJECT_ID", "p"),
            ("PUBSUB_ENDPOINT", "https://pubsub.example.com"),
        ]);

        let config = PubSubConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "https://pubsub.example.com");
    }
}
