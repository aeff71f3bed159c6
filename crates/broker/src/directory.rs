//! Address book of in-process brokers.
//!
//! Stands in for network resolution: a broker is "reachable" at an address
//! once it has been hosted there.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::config::BrokerConfig;
use crate::error::BrokerError;
use crate::memory::MemoryBroker;
use crate::port::Broker;

/// Maps bootstrap addresses to hosted brokers.
#[derive(Debug, Clone, Default)]
pub struct BrokerDirectory {
    shared: Arc<DirectoryShared>,
}

#[derive(Debug, Default)]
struct DirectoryShared {
    hosts: Mutex<HashMap<String, MemoryBroker>>,
    changed: Notify,
}

impl BrokerDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `broker` reachable at `address`, replacing any previous one.
    pub fn host(&self, address: impl Into<String>, broker: MemoryBroker) {
        let address = address.into();
        tracing::info!(%address, partitions = broker.partitions(), "hosting broker");
        self.shared.hosts.lock().insert(address, broker);
        self.shared.changed.notify_waiters();
    }

    /// Stop serving `address`.
    pub fn unhost(&self, address: &str) -> Option<MemoryBroker> {
        self.shared.hosts.lock().remove(address)
    }

    /// Broker hosted at `address`, if any.
    pub fn lookup(&self, address: &str) -> Option<MemoryBroker> {
        self.shared.hosts.lock().get(address).cloned()
    }

    /// Connect to the first hosted address in `config`.
    ///
    /// Waits up to `connect_timeout` for one to appear. Failing here is the
    /// one error a process cannot continue past.
    pub async fn connect(&self, config: &BrokerConfig) -> Result<Arc<dyn Broker>, BrokerError> {
        config.validate()?;
        let deadline = Instant::now() + config.connect_timeout;
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if let Some((address, broker)) = self.first_hosted(config) {
                tracing::info!(%address, "connected to broker");
                return Ok(Arc::new(broker));
            }
            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                return Err(BrokerError::UnknownAddress {
                    addresses: config.addresses(),
                });
            }
        }
    }

    fn first_hosted(&self, config: &BrokerConfig) -> Option<(String, MemoryBroker)> {
        let hosts = self.shared.hosts.lock();
        config
            .bootstrap_servers
            .iter()
            .map(|a| a.trim())
            .find_map(|a| hosts.get(a).map(|b| (a.to_owned(), b.clone())))
    }
}
