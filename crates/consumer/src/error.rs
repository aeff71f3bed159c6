//! Consumer errors.

use std::fmt;
use std::time::Duration;

use beacon_broker::BrokerError;
use beacon_core::{CodecError, Topic};

/// Rejected consumer configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No topic to subscribe to.
    #[error("at least one topic must be subscribed")]
    NoTopics,

    /// A topic is listed more than once.
    #[error("topic {0} is subscribed twice")]
    DuplicateTopic(Topic),

    /// Consumer group id is blank.
    #[error("consumer group for {0} must not be empty")]
    EmptyGroup(Topic),

    /// Two topics would share a read position.
    #[error("topics {first} and {second} share consumer group {group:?}")]
    SharedGroup {
        /// Group id used twice.
        group: String,
        /// First topic using it.
        first: Topic,
        /// Second topic using it.
        second: Topic,
    },

    /// A duration that must be positive is zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Offending field.
        field: &'static str,
    },

    /// Index name is blank.
    #[error("index name must not be empty")]
    EmptyIndexName,

    /// Index store URL is not an http(s) URL.
    #[error("index store url must start with http:// or https://, got {0:?}")]
    IndexUrl(String),
}

/// Failure reported by an index store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Creating an index that is already there.
    #[error("index {index} already exists")]
    AlreadyExists {
        /// Index name.
        index: String,
    },

    /// The store answered with an unexpected status.
    #[error("index store returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The request did not complete in time.
    #[error("index store request timed out after {0:?}")]
    Timeout(Duration),

    /// The store could not be reached.
    #[error("index store unavailable: {0}")]
    Unavailable(String),

    /// Transport failure.
    #[error("index store request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A log event that could not be persisted. The event is dropped.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The event could not be turned into a document.
    #[error(transparent)]
    Encode(#[from] CodecError),

    /// The store refused or failed the write.
    #[error("failed to persist into {index}: {source}")]
    Store {
        /// Destination index.
        index: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

/// Which handler of the dispatch set failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Operator line.
    Render,
    /// Alert line.
    Alert,
    /// Index write.
    Persist,
}

impl HandlerKind {
    /// Lowercase handler name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Alert => "alert",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one handler for one message.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Writing to the line sink failed.
    #[error("failed to write line: {0}")]
    Sink(#[from] std::io::Error),

    /// Persisting the event failed.
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The handler panicked.
    #[error("{handler} handler panicked: {message}")]
    Panicked {
        /// Handler that panicked.
        handler: HandlerKind,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Failure to start the consumer.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Joining a topic's consumer group failed.
    #[error("failed to subscribe to {topic} as {group}: {source}")]
    Subscribe {
        /// Topic.
        topic: Topic,
        /// Consumer group.
        group: String,
        /// Broker failure.
        #[source]
        source: BrokerError,
    },

    /// The index store client could not be built.
    #[error(transparent)]
    Store(#[from] StoreError),
}
