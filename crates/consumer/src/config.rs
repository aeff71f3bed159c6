//! Consumer settings.

use std::time::Duration;

use beacon_core::Topic;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default index receiving log documents.
pub const DEFAULT_INDEX: &str = "microservice_logs";

/// Everything a consumer process needs besides its broker connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Topics to read. Each gets its own loop.
    pub topics: Vec<Topic>,

    /// Consumer group per topic.
    pub groups: GroupConfig,

    /// How long one fetch waits for a message before checking for shutdown.
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,

    /// Pause after a broker error before fetching again.
    #[serde(with = "humantime_serde")]
    pub error_backoff: Duration,

    /// Index store for log events. Persistence is off when absent.
    pub index: Option<IndexConfig>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            topics: Topic::ALL.to_vec(),
            groups: GroupConfig::default(),
            fetch_timeout: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
            index: None,
        }
    }
}

impl ConsumerConfig {
    /// Default settings with persistence into `index`.
    pub fn with_index(index: IndexConfig) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics.is_empty() {
            return Err(ConfigError::NoTopics);
        }
        for (i, topic) in self.topics.iter().enumerate() {
            if self.topics[..i].contains(topic) {
                return Err(ConfigError::DuplicateTopic(*topic));
            }
            if self.groups.for_topic(*topic).trim().is_empty() {
                return Err(ConfigError::EmptyGroup(*topic));
            }
        }
        for (i, first) in Topic::ALL.iter().enumerate() {
            for second in &Topic::ALL[i + 1..] {
                let group = self.groups.for_topic(*first);
                if group == self.groups.for_topic(*second) {
                    return Err(ConfigError::SharedGroup {
                        group: group.to_owned(),
                        first: *first,
                        second: *second,
                    });
                }
            }
        }
        for (field, value) in [
            ("fetch_timeout", self.fetch_timeout),
            ("error_backoff", self.error_backoff),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }
        if let Some(index) = &self.index {
            index.validate()?;
        }
        Ok(())
    }
}

/// Consumer group ids, one per topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Group reading registrations.
    pub registration: String,
    /// Group reading heartbeats.
    pub heartbeat: String,
    /// Group reading logs.
    pub log: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            registration: Topic::Registration.default_group().to_owned(),
            heartbeat: Topic::Heartbeat.default_group().to_owned(),
            log: Topic::Log.default_group().to_owned(),
        }
    }
}

impl GroupConfig {
    /// Group id used for `topic`.
    pub fn for_topic(&self, topic: Topic) -> &str {
        match topic {
            Topic::Registration => &self.registration,
            Topic::Heartbeat => &self.heartbeat,
            Topic::Log => &self.log,
        }
    }
}

/// Search store receiving log documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Base URL of the store.
    pub url: String,

    /// Destination index.
    pub name: String,

    /// Deadline for one store request.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_owned(),
            name: DEFAULT_INDEX.to_owned(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl IndexConfig {
    /// Default settings pointing at `url`.
    pub fn at(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyIndexName);
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(ConfigError::IndexUrl(self.url.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "index.timeout",
            });
        }
        Ok(())
    }
}
