//! Broker topics.
//!
//! Each topic carries exactly one event kind. Consumers read every topic
//! under its own consumer group so the streams never share read position.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the three telemetry channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// One-shot node registrations.
    Registration,
    /// Periodic liveness reports.
    Heartbeat,
    /// Structured log lines.
    Log,
}

impl Topic {
    /// All topics, in dependency order.
    pub const ALL: [Topic; 3] = [Topic::Registration, Topic::Heartbeat, Topic::Log];

    /// Broker channel name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Registration => "microservice_registration",
            Self::Heartbeat => "microservice_heartbeats",
            Self::Log => "microservice_logs",
        }
    }

    /// Consumer group a subscriber uses unless configured otherwise.
    #[must_use]
    pub const fn default_group(self) -> &'static str {
        match self {
            Self::Registration => "registration-consumer",
            Self::Heartbeat => "heartbeat-consumer",
            Self::Log => "log-consumer",
        }
    }

    /// Resolve a broker channel name back to its topic.
    pub fn from_name(name: &str) -> Result<Self, UnknownTopic> {
        Self::ALL
            .into_iter()
            .find(|topic| topic.name() == name)
            .ok_or_else(|| UnknownTopic(name.to_owned()))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = UnknownTopic;

    /// Accepts either the channel name or the short kind (`registration`,
    /// `heartbeat`, `log`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(Self::Registration),
            "heartbeat" => Ok(Self::Heartbeat),
            "log" => Ok(Self::Log),
            other => Self::from_name(other),
        }
    }
}

/// A channel name that is not one of the telemetry topics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Topic::Registration, "microservice_registration", "registration-consumer")]
    #[case(Topic::Heartbeat, "microservice_heartbeats", "heartbeat-consumer")]
    #[case(Topic::Log, "microservice_logs", "log-consumer")]
    fn names_and_groups(#[case] topic: Topic, #[case] name: &str, #[case] group: &str) {
        assert_eq!(topic.name(), name);
        assert_eq!(topic.default_group(), group);
        assert_eq!(Topic::from_name(name), Ok(topic));
    }

    #[test]
    fn groups_are_distinct() {
        let groups: std::collections::HashSet<_> =
            Topic::ALL.iter().map(|t| t.default_group()).collect();
        assert_eq!(groups.len(), Topic::ALL.len());
    }

    #[test]
    fn parses_short_kind() {
        assert_eq!("heartbeat".parse::<Topic>(), Ok(Topic::Heartbeat));
        assert_eq!("microservice_logs".parse::<Topic>(), Ok(Topic::Log));
    }

    #[test]
    fn rejects_unknown_channel() {
        let err = "orders".parse::<Topic>().unwrap_err();
        assert_eq!(err.to_string(), "unknown topic: orders");
    }
}
