use crate::error::AdapterError;
use async_trait::async_trait;
use model::records::record::Record;

/// Size sample reported by a source collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Average encoded record size; 0 when the store has nothing to sample.
    pub avg_record_size_bytes: u64,
    pub record_count: u64,
}

/// Read side of a collection handle.
///
/// `read` must return records in an order that is stable across calls as
/// long as the collection is not mutated, so consecutive offset windows
/// neither skip nor repeat records.
#[async_trait]
pub trait SourceCollection: Send + Sync {
    fn name(&self) -> &str;

    async fn count(&self) -> Result<u64, AdapterError>;

    /// Up to `limit` records starting at `offset`; empty past the end.
    async fn read(&self, offset: u64, limit: usize) -> Result<Vec<Record>, AdapterError>;

    async fn stats(&self) -> Result<CollectionStats, AdapterError>;
}

/// Write side of a collection handle.
#[async_trait]
pub trait TargetCollection: Send + Sync {
    fn name(&self) -> &str;

    /// Removes every record; returns how many were deleted.
    async fn clear(&self) -> Result<u64, AdapterError>;

    /// Appends `records` in order; returns how many the store acknowledged.
    async fn insert_many(&self, records: Vec<Record>) -> Result<usize, AdapterError>;
}
