//! Topic selection shared by topic-routed brokers.

use std::env;

use fleetcast_events::EventSource;

/// Fallback topic used for every unset topic id.
pub const DEFAULT_TOPIC_ID: &str = "gameserver.events";

/// Per-source topic ids with a generic fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicConfig {
    pub generic_topic_id: String,
    pub on_add_topic_id: String,
    pub on_update_topic_id: String,
    pub on_delete_topic_id: String,
}

impl TopicConfig {
    /// Use `topic_id` for every event source.
    pub fn generic(topic_id: impl Into<String>) -> Self {
        Self {
            generic_topic_id: topic_id.into(),
            ..Self::default()
        }
    }

    /// Load topic ids from environment variables.
    ///
    /// All optional:
    /// - `FLEETCAST_TOPIC_ID`: generic fallback topic
    /// - `FLEETCAST_ON_ADD_TOPIC_ID`
    /// - `FLEETCAST_ON_UPDATE_TOPIC_ID`
    /// - `FLEETCAST_ON_DELETE_TOPIC_ID`
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).unwrap_or_default();
        Self {
            generic_topic_id: var("FLEETCAST_TOPIC_ID"),
            on_add_topic_id: var("FLEETCAST_ON_ADD_TOPIC_ID"),
            on_update_topic_id: var("FLEETCAST_ON_UPDATE_TOPIC_ID"),
            on_delete_topic_id: var("FLEETCAST_ON_DELETE_TOPIC_ID"),
        }
    }

    #[must_use]
    pub fn with_on_add(mut self, topic_id: impl Into<String>) -> Self {
        self.on_add_topic_id = topic_id.into();
        self
    }

    #[must_use]
    pub fn with_on_update(mut self, topic_id: impl Into<String>) -> Self {
        self.on_update_topic_id = topic_id.into();
        self
    }

    #[must_use]
    pub fn with_on_delete(mut self, topic_id: impl Into<String>) -> Self {
        self.on_delete_topic_id = topic_id.into();
        self
    }

    /// Fill unset topics. The generic topic defaults to
    /// [`DEFAULT_TOPIC_ID`]; per-source topics default to the generic one.
    pub fn apply_defaults(&mut self) {
        if self.generic_topic_id.is_empty() {
            self.generic_topic_id = DEFAULT_TOPIC_ID.to_string();
        }
        let generic = self.generic_topic_id.clone();
        for topic in [
            &mut self.on_add_topic_id,
            &mut self.on_update_topic_id,
            &mut self.on_delete_topic_id,
        ] {
            if topic.is_empty() {
                topic.clone_from(&generic);
            }
        }
    }

    /// Destination topic for events from `source`.
    #[must_use]
    pub fn topic_for(&self, source: EventSource) -> &str {
        let topic = match source {
            EventSource::OnAdd => &self.on_add_topic_id,
            EventSource::OnUpdate => &self.on_update_topic_id,
            EventSource::OnDelete => &self.on_delete_topic_id,
        };
        if topic.is_empty() {
            &self.generic_topic_id
        } else {
            topic
        }
    }
}
