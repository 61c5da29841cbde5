use crate::{context::job::CollectionJob, error::TransferError};
use connectors::collection::TargetCollection;
use model::records::batch::Batch;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteResult {
    pub records_submitted: usize,
    /// What the target acknowledged; may be lower than submitted.
    pub records_written: usize,
    pub bytes: u64,
    pub duration: Duration,
}

impl WriteResult {
    /// Records the target did not acknowledge.
    pub fn discrepancy(&self) -> usize {
        self.records_submitted.saturating_sub(self.records_written)
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.records_written as f64 / secs
        } else {
            0.0
        }
    }
}

/// Full-replace writer for one target collection.
///
/// Batches can only be written through the [`PreparedBatchWriter`] that
/// [`BatchWriter::prepare`] returns, so the target is always cleared first.
pub struct BatchWriter {
    collection: String,
    target: Arc<dyn TargetCollection>,
}

impl BatchWriter {
    pub fn new(job: &CollectionJob) -> Self {
        BatchWriter {
            collection: job.name().to_string(),
            target: Arc::clone(job.target()),
        }
    }

    /// Deletes everything in the target.
    pub async fn prepare(self) -> Result<PreparedBatchWriter, TransferError> {
        let cleared = self
            .target
            .clear()
            .await
            .map_err(|source| TransferError::Prepare {
                collection: self.collection.clone(),
                source,
            })?;

        info!(collection = %self.collection, cleared, "Cleared target collection");

        Ok(PreparedBatchWriter {
            collection: self.collection,
            target: self.target,
            cleared,
        })
    }
}

pub struct PreparedBatchWriter {
    collection: String,
    target: Arc<dyn TargetCollection>,
    cleared: u64,
}

impl PreparedBatchWriter {
    /// Records removed from the target by `prepare`.
    pub fn cleared(&self) -> u64 {
        self.cleared
    }

    /// Appends every record of `batch` in one call.
    pub async fn write_batch(&self, batch: Batch) -> Result<WriteResult, TransferError> {
        let start = std::time::Instant::now();
        let submitted = batch.len();
        let bytes = batch.size_bytes() as u64;

        if batch.is_empty() {
            return Ok(WriteResult {
                records_submitted: 0,
                records_written: 0,
                bytes: 0,
                duration: start.elapsed(),
            });
        }

        debug!(
            collection = %self.collection,
            batch_id = %batch.id,
            records = submitted,
            offset = batch.offset,
            "Writing batch to target"
        );

        let batch_id = batch.id.clone();
        let offset = batch.offset;
        let written = self
            .target
            .insert_many(batch.into_records())
            .await
            .map_err(|source| TransferError::Write {
                collection: self.collection.clone(),
                batch_id: batch_id.clone(),
                offset,
                records: submitted,
                source,
            })?;

        let result = WriteResult {
            records_submitted: submitted,
            records_written: written,
            bytes,
            duration: start.elapsed(),
        };

        if result.discrepancy() > 0 {
            warn!(
                collection = %self.collection,
                batch_id = %batch_id,
                submitted,
                written,
                missing = result.discrepancy(),
                "Target acknowledged fewer records than submitted"
            );
        }

        debug!(
            collection = %self.collection,
            batch_id = %batch_id,
            records = written,
            duration_ms = result.duration.as_millis(),
            records_per_sec = %format!("{:.2}", result.records_per_second()),
            "Batch written"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use connectors::{error::AdapterError, memory::MemoryStore};
    use model::records::record::Record;
    use tracing_test::traced_test;

    fn records(n: i64) -> Vec<Record> {
        (0..n).map(|i| Record::new().with("_id", i)).collect()
    }

    fn job(store: &MemoryStore) -> CollectionJob {
        CollectionJob::new(
            "orders",
            Arc::new(MemoryStore::new().collection("orders")),
            Arc::new(store.collection("orders")),
            0,
        )
    }

    /// Acknowledges one record less than it was given.
    struct LossyTarget;

    #[async_trait]
    impl TargetCollection for LossyTarget {
        fn name(&self) -> &str {
            "lossy"
        }

        async fn clear(&self) -> Result<u64, AdapterError> {
            Ok(0)
        }

        async fn insert_many(&self, records: Vec<Record>) -> Result<usize, AdapterError> {
            Ok(records.len().saturating_sub(1))
        }
    }

    #[tokio::test]
    async fn prepare_replaces_existing_contents() {
        let store = MemoryStore::new();
        store.seed("orders", records(4)).await;

        let writer = BatchWriter::new(&job(&store)).prepare().await.unwrap();
        assert_eq!(writer.cleared(), 4);
        assert_eq!(store.len("orders").await, 0);

        let result = writer
            .write_batch(Batch::new("orders", 0, records(3)))
            .await
            .unwrap();
        assert_eq!(result.records_written, 3);
        assert_eq!(result.discrepancy(), 0);
        assert!(result.bytes > 0);
        assert_eq!(store.len("orders").await, 3);
    }

    #[tokio::test]
    async fn empty_batch_is_not_sent() {
        let store = MemoryStore::new();
        let writer = BatchWriter::new(&job(&store)).prepare().await.unwrap();
        let result = writer.write_batch(Batch::new("orders", 0, vec![])).await.unwrap();
        assert_eq!(result.records_submitted, 0);
        assert_eq!(store.len("orders").await, 0);
    }

    #[traced_test]
    #[tokio::test]
    async fn short_insert_is_reported() {
        let job = CollectionJob::new(
            "lossy",
            Arc::new(MemoryStore::new().collection("lossy")),
            Arc::new(LossyTarget),
            0,
        );
        let writer = BatchWriter::new(&job).prepare().await.unwrap();
        let result = writer
            .write_batch(Batch::new("lossy", 0, records(5)))
            .await
            .unwrap();

        assert_eq!(result.records_submitted, 5);
        assert_eq!(result.records_written, 4);
        assert_eq!(result.discrepancy(), 1);
        assert!(logs_contain("Target acknowledged fewer records than submitted"));
    }
}
