//! Broker port.
//!
//! The rest of the system only sees these traits. A broker delivers
//! messages of one topic-partition in publish order and tracks read
//! position per consumer group.

use std::time::Duration;

use async_trait::async_trait;
use beacon_core::Topic;

use crate::error::BrokerError;

/// A message as read back from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message was published to.
    pub topic: Topic,
    /// Partition within the topic.
    pub partition: u32,
    /// Position within the partition.
    pub offset: u64,
    /// Partitioning key.
    pub key: String,
    /// Encoded event.
    pub payload: Vec<u8>,
}

/// Where a published message landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Partition the message was appended to.
    pub partition: u32,
    /// Offset it was given.
    pub offset: u64,
}

/// Publish/subscribe primitive.
///
/// Messages sharing a key go to the same partition, so they are read back
/// in the order they were published.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Append `payload` to `topic`, partitioned by `key`.
    async fn publish(
        &self,
        topic: Topic,
        key: &str,
        payload: Vec<u8>,
    ) -> Result<Delivery, BrokerError>;

    /// Join consumer group `group` on `topic`.
    ///
    /// Subscriptions in different groups each see every message.
    /// Subscriptions in the same group share one read position.
    async fn subscribe(
        &self,
        topic: Topic,
        group: &str,
    ) -> Result<Box<dyn Subscription>, BrokerError>;
}

/// Read side of one consumer group on one topic.
#[async_trait]
pub trait Subscription: Send {
    /// Topic this subscription reads.
    fn topic(&self) -> Topic;

    /// Consumer group it reads under.
    fn group(&self) -> &str;

    /// Next unread message, waiting up to `timeout`.
    ///
    /// `Ok(None)` means nothing arrived in time.
    async fn fetch(&mut self, timeout: Duration) -> Result<Option<Message>, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct NullBroker;

    #[async_trait]
    impl Broker for NullBroker {
        async fn publish(
            &self,
            _topic: Topic,
            _key: &str,
            _payload: Vec<u8>,
        ) -> Result<Delivery, BrokerError> {
            Err(BrokerError::Closed)
        }

        async fn subscribe(
            &self,
            _topic: Topic,
            _group: &str,
        ) -> Result<Box<dyn Subscription>, BrokerError> {
            Err(BrokerError::Closed)
        }
    }

    #[tokio::test]
    async fn broker_is_object_safe() {
        let broker: Arc<dyn Broker> = Arc::new(NullBroker);
        let err = broker.publish(Topic::Log, "k", vec![]).await.unwrap_err();
        assert_eq!(err, BrokerError::Closed);
        assert!(broker.subscribe(Topic::Log, "g").await.is_err());
    }
}
