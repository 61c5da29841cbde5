use crate::{
    collection::{CollectionStats, SourceCollection, TargetCollection},
    error::AdapterError,
};
use async_trait::async_trait;
use model::records::record::Record;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local document store keyed by collection name.
///
/// Clones share the same underlying data, so a test can hold the store
/// while the engine writes through handles obtained from it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to `name`; the collection is created lazily on first write.
    pub fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            name: name.to_string(),
            store: self.clone(),
        }
    }

    /// Replaces the contents of `name` with `records`.
    pub async fn seed(&self, name: &str, records: Vec<Record>) {
        self.collections
            .write()
            .await
            .insert(name.to_string(), records);
    }

    pub async fn records(&self, name: &str) -> Vec<Record> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn len(&self, name: &str) -> usize {
        self.collections
            .read()
            .await
            .get(name)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCollection {
    name: String,
    store: MemoryStore,
}

#[async_trait]
impl SourceCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn count(&self) -> Result<u64, AdapterError> {
        Ok(self.store.len(&self.name).await as u64)
    }

    async fn read(&self, offset: u64, limit: usize) -> Result<Vec<Record>, AdapterError> {
        let guard = self.store.collections.read().await;
        let records = match guard.get(&self.name) {
            Some(records) => records,
            None => return Ok(Vec::new()),
        };

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(records.len());
        let end = start.saturating_add(limit).min(records.len());
        Ok(records[start..end].to_vec())
    }

    async fn stats(&self) -> Result<CollectionStats, AdapterError> {
        let guard = self.store.collections.read().await;
        let records = guard.get(&self.name).map(|r| r.as_slice()).unwrap_or(&[]);
        let record_count = records.len() as u64;
        let total: u64 = records.iter().map(|r| r.size_bytes() as u64).sum();

        Ok(CollectionStats {
            avg_record_size_bytes: if record_count == 0 {
                0
            } else {
                total / record_count
            },
            record_count,
        })
    }
}

#[async_trait]
impl TargetCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn clear(&self) -> Result<u64, AdapterError> {
        let mut guard = self.store.collections.write().await;
        let removed = guard
            .insert(self.name.clone(), Vec::new())
            .map(|old| old.len() as u64)
            .unwrap_or(0);
        debug!(collection = %self.name, removed, "Cleared in-memory collection");
        Ok(removed)
    }

    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, AdapterError> {
        let inserted = records.len();
        self.store
            .collections
            .write()
            .await
            .entry(self.name.clone())
            .or_default()
            .extend(records);
        Ok(inserted)
    }
}
