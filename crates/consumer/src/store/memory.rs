//! In-process index store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::IndexStore;
use crate::error::StoreError;

/// Index store kept in memory.
///
/// Like the search store, writing to a missing index creates it.
#[derive(Debug, Clone)]
pub struct MemoryIndexStore {
    indices: Arc<Mutex<BTreeMap<String, Vec<Value>>>>,
    available: Arc<AtomicBool>,
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self {
            indices: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl MemoryIndexStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request fail with [`StoreError::Unavailable`] until
    /// turned back on.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Names of every index.
    pub fn indices(&self) -> Vec<String> {
        self.indices.lock().keys().cloned().collect()
    }

    /// Documents of `index`, in write order.
    pub fn documents(&self, index: &str) -> Vec<Value> {
        self.indices.lock().get(index).cloned().unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store switched off".into()))
        }
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.indices.lock().contains_key(index))
    }

    async fn create_index(&self, index: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut indices = self.indices.lock();
        if indices.contains_key(index) {
            return Err(StoreError::AlreadyExists {
                index: index.to_owned(),
            });
        }
        indices.insert(index.to_owned(), Vec::new());
        Ok(())
    }

    async fn index_document(&self, index: &str, document: &Value) -> Result<(), StoreError> {
        self.check()?;
        self.indices
            .lock()
            .entry(index.to_owned())
            .or_default()
            .push(document.clone());
        Ok(())
    }
}
