//! Search-store port.
//!
//! The persister only needs three operations: check an index, create it and
//! append one document to it.

mod http;
mod memory;

pub use http::HttpIndexStore;
pub use memory::MemoryIndexStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

/// Destination for log documents.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Whether `index` exists.
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError>;

    /// Create `index`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when another writer created
    /// it first.
    async fn create_index(&self, index: &str) -> Result<(), StoreError>;

    /// Append `document` to `index`.
    async fn index_document(&self, index: &str, document: &Value) -> Result<(), StoreError>;
}
