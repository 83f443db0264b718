//! Kafka connection settings.
//!
//! Managed clusters authenticate with an API key and secret over SASL; when
//! a key is configured the connection defaults to `SASL_SSL` with `PLAIN`.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::BrokerError;
use crate::topics::TopicConfig;

/// Default time to wait for a delivery report.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default `client.id`.
pub const DEFAULT_CLIENT_ID: &str = "fleetcast";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityProtocol {
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    const ALL: [Self; 4] = [
        Self::Plaintext,
        Self::Ssl,
        Self::SaslPlaintext,
        Self::SaslSsl,
    ];

    /// librdkafka `security.protocol` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::Ssl => "SSL",
            Self::SaslPlaintext => "SASL_PLAINTEXT",
            Self::SaslSsl => "SASL_SSL",
        }
    }

    #[must_use]
    pub fn requires_sasl(&self) -> bool {
        matches!(self, Self::SaslPlaintext | Self::SaslSsl)
    }
}

impl FromStr for SecurityProtocol {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| BrokerError::ConfigInvalid {
                var: "KAFKA_SECURITY_PROTOCOL".to_string(),
                reason: format!("unsupported protocol {s}"),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaslMechanism {
    #[default]
    Plain,
    ScramSha256,
    ScramSha512,
}

impl SaslMechanism {
    const ALL: [Self; 3] = [Self::Plain, Self::ScramSha256, Self::ScramSha512];

    /// librdkafka `sasl.mechanism` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha512 => "SCRAM-SHA-512",
        }
    }
}

impl FromStr for SaslMechanism {
    type Err = BrokerError;

    /// Accepts `_` in place of `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| BrokerError::ConfigInvalid {
                var: "KAFKA_SASL_MECHANISM".to_string(),
                reason: format!("unsupported mechanism {s}"),
            })
    }
}

/// API key and secret sent as SASL username and password.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Kafka broker settings.
#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub security_protocol: SecurityProtocol,
    pub mechanism: SaslMechanism,
    pub credentials: Option<ApiCredentials>,
    pub client_id: String,
    pub topics: TopicConfig,
    /// Bound on the wait for a delivery report.
    pub delivery_timeout: Duration,
}

impl KafkaConfig {
    /// Plaintext config without credentials.
    pub fn new(bootstrap_servers: impl Into<String>) -> Self {
        Self {
            bootstrap_servers: bootstrap_servers.into(),
            security_protocol: SecurityProtocol::Plaintext,
            mechanism: SaslMechanism::default(),
            credentials: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            topics: TopicConfig::default(),
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
        }
    }

    /// Read the config from the environment.
    ///
    /// `KAFKA_BOOTSTRAP_SERVERS` is required. `KAFKA_API_KEY` and
    /// `KAFKA_API_SECRET` go together; with both set the protocol defaults to
    /// `SASL_SSL`.
    /// `KAFKA_SECURITY_PROTOCOL`, `KAFKA_SASL_MECHANISM`, `KAFKA_CLIENT_ID`
    /// and `KAFKA_DELIVERY_TIMEOUT_MS` override the defaults. Topics come from
    /// [`TopicConfig::from_env`].
    pub fn from_env() -> Result<Self, BrokerError> {
        let optional = |var: &str| env::var(var).ok().filter(|v| !v.is_empty());

        let bootstrap_servers =
            optional("KAFKA_BOOTSTRAP_SERVERS").ok_or_else(|| BrokerError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
            })?;

        let mut config = Self::new(bootstrap_servers).with_topics(TopicConfig::from_env());

        match (optional("KAFKA_API_KEY"), optional("KAFKA_API_SECRET")) {
            (Some(key), Some(secret)) => config = config.with_credentials(key, secret),
            (Some(_), None) => {
                return Err(BrokerError::ConfigMissing {
                    var: "KAFKA_API_SECRET".to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(BrokerError::ConfigMissing {
                    var: "KAFKA_API_KEY".to_string(),
                })
            }
            (None, None) => {}
        }
        if let Some(protocol) = optional("KAFKA_SECURITY_PROTOCOL") {
            config.security_protocol = protocol.parse()?;
        }
        if let Some(mechanism) = optional("KAFKA_SASL_MECHANISM") {
            config.mechanism = mechanism.parse()?;
        }
        if let Some(client_id) = optional("KAFKA_CLIENT_ID") {
            config.client_id = client_id;
        }
        if let Some(ms) = optional("KAFKA_DELIVERY_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|e| BrokerError::ConfigInvalid {
                var: "KAFKA_DELIVERY_TIMEOUT_MS".to_string(),
                reason: format!("{ms}: {e}"),
            })?;
            config.delivery_timeout = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Authenticate with an API key. Switches the protocol to `SASL_SSL`.
    #[must_use]
    pub fn with_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Some(ApiCredentials {
            key: key.into(),
            secret: secret.into(),
        });
        self.security_protocol = SecurityProtocol::SaslSsl;
        self
    }

    #[must_use]
    pub fn with_security_protocol(mut self, protocol: SecurityProtocol) -> Self {
        self.security_protocol = protocol;
        self
    }

    #[must_use]
    pub fn with_mechanism(mut self, mechanism: SaslMechanism) -> Self {
        self.mechanism = mechanism;
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: TopicConfig) -> Self {
        self.topics = topics;
        self
    }

    #[must_use]
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BrokerError> {
        if self.bootstrap_servers.trim().is_empty() {
            return Err(BrokerError::ConfigMissing {
                var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
            });
        }
        if self.security_protocol.requires_sasl() && self.credentials.is_none() {
            return Err(BrokerError::ConfigMissing {
                var: "KAFKA_API_KEY".to_string(),
            });
        }
        if self.delivery_timeout.is_zero() {
            return Err(BrokerError::ConfigInvalid {
                var: "KAFKA_DELIVERY_TIMEOUT_MS".to_string(),
                reason: "must be greater than zero".to_string(),
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
    fn test_protocol_and_mechanism_labels() {
        for protocol in SecurityProtocol::ALL {
            assert_eq!(protocol.as_str().parse::<SecurityProtocol>().unwrap(), protocol);
        }
        assert_eq!(
            "sasl_ssl".parse::<SecurityProtocol>().unwrap(),
            SecurityProtocol::SaslSsl
        );
        assert_eq!(
            "scram_sha_256".parse::<SaslMechanism>().unwrap(),
            SaslMechanism::ScramSha256
        );
        assert!("kerberos".parse::<SecurityProtocol>().is_err());
        assert!("GSSAPI".parse::<SaslMechanism>().is_err());
    }

    #[test]
    fn test_new_is_plaintext() {
        let config = KafkaConfig::new("localhost:9092");

        assert_eq!(config.security_protocol, SecurityProtocol::Plaintext);
        assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.delivery_timeout, DEFAULT_DELIVERY_TIMEOUT);
        assert!(config.credentials.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_switch_to_sasl_ssl() {
        let config = KafkaConfig::new("pkc-123.confluent.cloud:9092")
            .with_credentials("key", "secret")
            .with_topics(TopicConfig::default().with_on_delete("gs.deleted"));

        assert_eq!(config.security_protocol, SecurityProtocol::SaslSsl);
        assert_eq!(config.mechanism, SaslMechanism::Plain);
        assert_eq!(config.topics.on_delete_topic_id, "gs.deleted");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sasl_without_credentials_is_rejected() {
        let config = KafkaConfig::new("localhost:9092")
            .with_security_protocol(SecurityProtocol::SaslPlaintext);

        match config.validate() {
            Err(BrokerError::ConfigMissing { var }) => assert_eq!(var, "KAFKA_API_KEY"),
            other => panic!("Expected ConfigMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_delivery_timeout_is_rejected() {
        let config = KafkaConfig::new("localhost:9092").with_delivery_timeout(Duration::ZERO);

        assert!(matches!(
            config.validate(),
            Err(BrokerError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_from_env_missing_bootstrap() {
        let _env = ScopedEnv::with(&[]);

        match KafkaConfig::from_env() {
            Err(BrokerError::ConfigMissing { var }) => assert_eq!(var, "KAFKA_BOOTSTRAP_SERVERS"),
            other => panic!("Expected ConfigMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_from_env_plaintext_defaults() {
        let _env = ScopedEnv::with(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("FLEETCAST_ON_UPDATE_TOPIC_ID", "gs.updates"),
        ]);

        let config = KafkaConfig::from_env().unwrap();

        assert_eq!(config.security_protocol, SecurityProtocol::Plaintext);
        assert!(config.credentials.is_none());
        assert_eq!(config.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.delivery_timeout, DEFAULT_DELIVERY_TIMEOUT);
        assert_eq!(config.topics.on_update_topic_id, "gs.updates");
    }

    #[test]
    fn test_from_env_api_key_enables_sasl_ssl() {
        let _env = ScopedEnv::with(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "pkc-123.confluent.cloud:9092"),
            ("KAFKA_API_KEY", "key"),
            ("KAFKA_API_SECRET", "secret"),
            ("KAFKA_SASL_MECHANISM", "SCRAM-SHA-512"),
            ("KAFKA_CLIENT_ID", "fleetcast-eu"),
        ]);

        let config = KafkaConfig::from_env().unwrap();

        assert_eq!(config.security_protocol, SecurityProtocol::SaslSsl);
        assert_eq!(config.mechanism, SaslMechanism::ScramSha512);
        assert_eq!(config.client_id, "fleetcast-eu");
        let credentials = config.credentials.unwrap();
        assert_eq!(credentials.key, "key");
        assert_eq!(credentials.secret, "secret");
    }

    #[test]
    fn test_from_env_rejects_half_set_credentials() {
        let cases = [
            (("KAFKA_API_KEY", "key-only"), "KAFKA_API_SECRET"),
            (("KAFKA_API_SECRET", "secret-only"), "KAFKA_API_KEY"),
        ];

        for (set, missing) in cases {
            let _env = ScopedEnv::with(&[("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"), set]);

            match KafkaConfig::from_env() {
                Err(BrokerError::ConfigMissing { var }) => assert_eq!(var, missing),
                other => panic!("Expected ConfigMissing for {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_from_env_sasl_protocol_without_credentials() {
        let _env = ScopedEnv::with(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("KAFKA_SECURITY_PROTOCOL", "sasl_plaintext"),
        ]);

        assert!(matches!(
            KafkaConfig::from_env(),
            Err(BrokerError::ConfigMissing { var }) if var == "KAFKA_API_KEY"
        ));
    }

    #[test]
    fn test_from_env_delivery_timeout() {
        {
            let _env = ScopedEnv::with(&[
                ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
                ("KAFKA_DELIVERY_TIMEOUT_MS", "1500"),
            ]);
            let config = KafkaConfig::from_env().unwrap();
            assert_eq!(config.delivery_timeout, Duration::from_millis(1500));
        }

        let _env = ScopedEnv::with(&[
            ("KAFKA_BOOTSTRAP_SERVERS", "localhost:9092"),
            ("KAFKA_DELIVERY_TIMEOUT_MS", "soon"),
        ]);
        match KafkaConfig::from_env() {
            Err(BrokerError::ConfigInvalid { var, .. }) => {
                assert_eq!(var, "KAFKA_DELIVERY_TIMEOUT_MS");
            }
            other => panic!("Expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let config = KafkaConfig::new("localhost:9092").with_credentials("key", "hunter2");

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("key"));
    }
}
