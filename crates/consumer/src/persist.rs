//! Index persistence for log events.
//!
//! At most once: a failed write is counted, logged and the event dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_core::{LogEvent, codec};
use beacon_telemetry::{Counter, Diagnostics};

use crate::dispatch::PersistHandler;
use crate::error::{HandlerError, PersistError, StoreError};
use crate::metrics;
use crate::store::IndexStore;

/// Outcome of [`Persister::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index was created by this call.
    Created,
    /// The index was already there.
    Existing,
}

/// Writes log events into one index.
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn IndexStore>,
    index: String,
    timeout: Duration,
    persisted: Counter,
    failures: Counter,
    diagnostics: Diagnostics,
}

impl fmt::Debug for Persister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persister")
            .field("index", &self.index)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Persister {
    /// Persister writing to `index` of `store`; every request is bounded by
    /// `timeout`.
    pub fn new(
        store: Arc<dyn IndexStore>,
        index: impl Into<String>,
        timeout: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            store,
            index: index.into(),
            timeout,
            persisted: diagnostics.counter(metrics::PERSISTED),
            failures: diagnostics.counter(metrics::PERSIST_FAILURES),
            diagnostics,
        }
    }

    /// Destination index.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Create the index unless it exists.
    ///
    /// Losing a creation race to another writer counts as success.
    pub async fn ensure_index(&self) -> Result<IndexStatus, PersistError> {
        let exists = self
            .bounded(self.store.index_exists(&self.index))
            .await
            .map_err(|e| self.store_error(e))?;
        if exists {
            return Ok(IndexStatus::Existing);
        }
        match self.bounded(self.store.create_index(&self.index)).await {
            Ok(()) => {
                tracing::info!(
                    parent: self.diagnostics.span(),
                    index = %self.index,
                    "created index"
                );
                Ok(IndexStatus::Created)
            }
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(
                    parent: self.diagnostics.span(),
                    index = %self.index,
                    "index created concurrently"
                );
                Ok(IndexStatus::Existing)
            }
            Err(e) => Err(self.store_error(e)),
        }
    }

    /// Write `event` as a document, fields verbatim.
    pub async fn store(&self, event: &LogEvent) -> Result<(), PersistError> {
        let outcome = match codec::to_document(event) {
            Ok(document) => self
                .bounded(self.store.index_document(&self.index, &document))
                .await
                .map_err(|e| self.store_error(e)),
            Err(e) => Err(PersistError::from(e)),
        };
        match &outcome {
            Ok(()) => self.persisted.inc(),
            Err(e) => {
                self.failures.inc();
                tracing::warn!(
                    parent: self.diagnostics.span(),
                    node_id = %event.node_id(),
                    error = %e,
                    "dropping log event"
                );
            }
        }
        outcome
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        beacon_resilience::timeout(self.timeout, request)
            .await
            .unwrap_or_else(|e| Err(StoreError::Timeout(e.duration)))
    }

    fn store_error(&self, source: StoreError) -> PersistError {
        PersistError::Store {
            index: self.index.clone(),
            source,
        }
    }
}

#[async_trait]
impl PersistHandler for Persister {
    async fn persist(&self, event: &LogEvent) -> Result<(), HandlerError> {
        Ok(self.store(event).await?)
    }
}
