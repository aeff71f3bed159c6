//! In-process partitioned broker.
//!
//! Topics are created on first use with a fixed number of partitions. Each
//! consumer group keeps its own offset per partition, starting from the
//! earliest retained message. Once every group subscribed to a topic has
//! read a message it is dropped; offsets stay absolute.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::Topic;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::BrokerError;
use crate::port::{Broker, Delivery, Message, Subscription};

/// Broker living inside the current process.
///
/// Clones share the same topics.
#[derive(Debug, Clone)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    partitions: u32,
    available: AtomicBool,
    closed: AtomicBool,
    topics: Mutex<HashMap<Topic, TopicLog>>,
    arrivals: Notify,
}

#[derive(Debug)]
struct TopicLog {
    partitions: Vec<Partition>,
    groups: HashMap<String, GroupCursor>,
}

#[derive(Debug, Default)]
struct Partition {
    /// Offset of the first retained message.
    base: u64,
    messages: VecDeque<Stored>,
}

impl Partition {
    /// Offset the next append receives.
    fn end(&self) -> u64 {
        self.base + self.messages.len() as u64
    }

    fn get(&self, offset: u64) -> Option<&Stored> {
        let index = offset.checked_sub(self.base)?;
        self.messages.get(usize::try_from(index).ok()?)
    }

    /// Drop every message below `offset`.
    fn truncate_before(&mut self, offset: u64) {
        while self.base < offset && self.messages.pop_front().is_some() {
            self.base += 1;
        }
    }
}

#[derive(Debug)]
struct Stored {
    key: String,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct GroupCursor {
    offsets: Vec<u64>,
    next_partition: usize,
}

impl TopicLog {
    fn new(partitions: u32) -> Self {
        Self {
            partitions: (0..partitions).map(|_| Partition::default()).collect(),
            groups: HashMap::new(),
        }
    }

    fn cursor(&mut self, group: &str) -> &mut GroupCursor {
        let partitions = &self.partitions;
        self.groups
            .entry(group.to_owned())
            .or_insert_with(|| GroupCursor {
                offsets: partitions.iter().map(|p| p.base).collect(),
                next_partition: 0,
            })
    }

    /// Drop what every group has read from `partition`.
    fn compact(&mut self, partition: usize) {
        let low = self.groups.values().map(|c| c.offsets[partition]).min();
        if let Some(low) = low {
            self.partitions[partition].truncate_before(low);
        }
    }

    fn retained(&self) -> usize {
        self.partitions.iter().map(|p| p.messages.len()).sum()
    }

    /// Next unread message for `group`, visiting partitions round-robin.
    fn take(&mut self, topic: Topic, group: &str) -> Option<Message> {
        let n = self.partitions.len();
        let cursor = self.groups.get_mut(group)?;
        for step in 0..n {
            let partition = (cursor.next_partition + step) % n;
            let offset = cursor.offsets[partition];
            if let Some(stored) = self.partitions[partition].get(offset) {
                let message = Message {
                    topic,
                    partition: partition as u32,
                    offset,
                    key: stored.key.clone(),
                    payload: stored.payload.clone(),
                };
                cursor.offsets[partition] += 1;
                cursor.next_partition = (partition + 1) % n;
                self.compact(partition);
                return Some(message);
            }
        }
        None
    }
}

impl Shared {
    fn check(&self) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Closed);
        }
        if !self.available.load(Ordering::Acquire) {
            return Err(BrokerError::Unavailable("broker is not accepting requests".into()));
        }
        Ok(())
    }
}

/// Stable FNV-1a hash so a key maps to the same partition in every process.
fn partition_for(key: &str, partitions: u32) -> u32 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let hash = key
        .bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    (hash % u64::from(partitions.max(1))) as u32
}

impl MemoryBroker {
    /// Broker with `partitions` partitions per topic (at least one).
    #[must_use]
    pub fn new(partitions: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                partitions: partitions.max(1),
                available: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                topics: Mutex::new(HashMap::new()),
                arrivals: Notify::new(),
            }),
        }
    }

    /// Partitions per topic.
    pub fn partitions(&self) -> u32 {
        self.shared.partitions
    }

    /// Toggle a simulated outage. While unavailable every request fails
    /// with [`BrokerError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.shared.available.store(available, Ordering::Release);
        self.shared.arrivals.notify_waiters();
    }

    /// Shut the broker down. Pending and future requests fail with
    /// [`BrokerError::Closed`].
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.arrivals.notify_waiters();
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Messages retained on `topic` across all partitions.
    pub fn len(&self, topic: Topic) -> usize {
        self.shared
            .topics
            .lock()
            .get(&topic)
            .map_or(0, TopicLog::retained)
    }

    /// Whether `topic` holds no messages.
    pub fn is_empty(&self, topic: Topic) -> bool {
        self.len(topic) == 0
    }

    /// Messages on `topic` that `group` has not read yet.
    pub fn lag(&self, topic: Topic, group: &str) -> usize {
        let topics = self.shared.topics.lock();
        let Some(log) = topics.get(&topic) else {
            return 0;
        };
        match log.groups.get(group) {
            Some(cursor) => log
                .partitions
                .iter()
                .zip(&cursor.offsets)
                .map(|(p, &offset)| p.end().saturating_sub(offset) as usize)
                .sum(),
            None => log.retained(),
        }
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(
        &self,
        topic: Topic,
        key: &str,
        payload: Vec<u8>,
    ) -> Result<Delivery, BrokerError> {
        self.shared.check()?;
        let partition = partition_for(key, self.shared.partitions);
        let offset = {
            let mut topics = self.shared.topics.lock();
            let log = topics
                .entry(topic)
                .or_insert_with(|| TopicLog::new(self.shared.partitions));
            let stored = &mut log.partitions[partition as usize];
            let offset = stored.end();
            stored.messages.push_back(Stored {
                key: key.to_owned(),
                payload,
            });
            offset
        };
        self.shared.arrivals.notify_waiters();
        tracing::trace!(%topic, partition, offset, "appended");
        Ok(Delivery { partition, offset })
    }

    async fn subscribe(
        &self,
        topic: Topic,
        group: &str,
    ) -> Result<Box<dyn Subscription>, BrokerError> {
        self.shared.check()?;
        self.shared
            .topics
            .lock()
            .entry(topic)
            .or_insert_with(|| TopicLog::new(self.shared.partitions))
            .cursor(group);
        tracing::debug!(%topic, group, "subscribed");
        Ok(Box::new(MemorySubscription {
            shared: self.shared.clone(),
            topic,
            group: group.to_owned(),
        }))
    }
}

/// Subscription handed out by [`MemoryBroker`].
#[derive(Debug)]
pub struct MemorySubscription {
    shared: Arc<Shared>,
    topic: Topic,
    group: String,
}

impl MemorySubscription {
    fn try_take(&self) -> Option<Message> {
        self.shared
            .topics
            .lock()
            .get_mut(&self.topic)
            .and_then(|log| log.take(self.topic, &self.group))
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    fn topic(&self) -> Topic {
        self.topic
    }

    fn group(&self) -> &str {
        &self.group
    }

    async fn fetch(&mut self, timeout: Duration) -> Result<Option<Message>, BrokerError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register for wakeups before looking, so an append between the
            // look and the wait is not missed.
            let arrival = self.shared.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            self.shared.check()?;
            if let Some(message) = self.try_take() {
                return Ok(Some(message));
            }
            if tokio::time::timeout_at(deadline, arrival).await.is_err() {
                return Ok(None);
            }
        }
    }
}
