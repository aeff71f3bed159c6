#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Beacon Broker
//!
//! Publish/subscribe transport for telemetry events.
//!
//! [`Broker`] and [`Subscription`] are the port the producer and consumer
//! are written against. [`MemoryBroker`] implements it inside the process
//! with keyed partitions and per-group offsets; [`BrokerDirectory`] resolves
//! configured bootstrap addresses to hosted brokers.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), beacon_broker::BrokerError> {
//! use std::time::Duration;
//! use beacon_broker::{Broker, BrokerConfig, BrokerDirectory, MemoryBroker};
//! use beacon_core::Topic;
//!
//! let directory = BrokerDirectory::new();
//! directory.host("localhost:9092", MemoryBroker::new(3));
//!
//! let broker = directory.connect(&BrokerConfig::default()).await?;
//! let mut sub = broker.subscribe(Topic::Log, "log-consumer").await?;
//! broker.publish(Topic::Log, "node-1", b"{}".to_vec()).await?;
//! let message = sub.fetch(Duration::from_secs(1)).await?;
//! assert!(message.is_some());
//! # Ok(())
//! # }
//! ```

mod config;
mod directory;
mod error;
mod memory;
mod port;

pub use config::BrokerConfig;
pub use directory::BrokerDirectory;
pub use error::BrokerError;
pub use memory::{MemoryBroker, MemorySubscription};
pub use port::{Broker, Delivery, Message, Subscription};
