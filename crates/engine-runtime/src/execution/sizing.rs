use connectors::collection::SourceCollection;
use engine_config::settings::TransferSettings;
use engine_core::{
    budget::BudgetEstimator,
    context::job::CollectionJob,
    memory::{CappedMemoryProbe, MemoryProbe, SystemMemoryProbe},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks the page size for each job.
pub struct PageSizer {
    fixed: Option<usize>,
    estimator: BudgetEstimator,
    probe: Arc<dyn MemoryProbe>,
}

impl PageSizer {
    pub fn new(settings: &TransferSettings) -> Self {
        let probe: Arc<dyn MemoryProbe> = match settings.memory_limit_bytes() {
            Some(limit) => Arc::new(CappedMemoryProbe::new(SystemMemoryProbe, limit)),
            None => Arc::new(SystemMemoryProbe),
        };

        PageSizer {
            fixed: settings.page_size(),
            estimator: settings.estimator(),
            probe,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Fixed size when configured, otherwise an estimate from current memory
    /// headroom and the source's average record size.
    ///
    /// Never fails: an unusable size sample is logged and treated as one
    /// byte per record, leaving the configured bounds to cap the result.
    pub async fn page_size(&self, job: &CollectionJob) -> usize {
        if let Some(fixed) = self.fixed {
            debug!(collection = %job.name(), page_size = fixed, "Using fixed page size");
            return fixed;
        }

        let avg = match job.source().stats().await {
            Ok(stats) if stats.avg_record_size_bytes > 0 => stats.avg_record_size_bytes,
            Ok(_) => {
                if job.estimated_total() > 0 {
                    warn!(collection = %job.name(), "Source reported no average record size");
                }
                0
            }
            Err(e) => {
                warn!(
                    collection = %job.name(),
                    error = %e,
                    "Failed to sample record size; falling back to minimum sample"
                );
                0
            }
        };

        let available = self.probe.available_bytes();
        let page_size = self.estimator.estimate(available, avg);
        debug!(
            collection = %job.name(),
            available_bytes = available,
            avg_record_size_bytes = avg,
            page_size,
            "Estimated page size"
        );
        page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::memory::MemoryStore;
    use engine_core::{budget::estimate, memory::FixedMemoryProbe};
    use model::records::record::Record;

    async fn job_with(records: Vec<Record>) -> CollectionJob {
        let store = MemoryStore::new();
        let total = records.len() as u64;
        store.seed("docs", records).await;
        CollectionJob::new(
            "docs",
            Arc::new(store.collection("docs")),
            Arc::new(MemoryStore::new().collection("docs")),
            total,
        )
    }

    #[tokio::test]
    async fn fixed_page_size_skips_estimation() {
        let settings = TransferSettings::builder().page_size(123).build().unwrap();
        let sizer = PageSizer::new(&settings).with_probe(Arc::new(FixedMemoryProbe(0)));
        assert_eq!(sizer.page_size(&job_with(vec![]).await).await, 123);
    }

    #[tokio::test]
    async fn estimates_from_sample_and_headroom() {
        let record = Record::new().with("_id", 1i64).with("pad", "x".repeat(80));
        let avg = record.size_bytes() as u64;
        let job = job_with(vec![record; 4]).await;

        let settings = TransferSettings::builder()
            .max_page_size(None)
            .build()
            .unwrap();
        let available = avg * 1000;
        let sizer = PageSizer::new(&settings).with_probe(Arc::new(FixedMemoryProbe(available)));

        let page_size = sizer.page_size(&job).await;
        assert_eq!(page_size, estimate(available, avg));
        assert!((699..=700).contains(&page_size));
    }

    #[tokio::test]
    async fn empty_source_is_clamped_by_max() {
        let settings = TransferSettings::builder()
            .max_page_size(Some(500))
            .build()
            .unwrap();
        let sizer = PageSizer::new(&settings).with_probe(Arc::new(FixedMemoryProbe(1 << 30)));
        assert_eq!(sizer.page_size(&job_with(vec![]).await).await, 500);
    }

    #[tokio::test]
    async fn memory_limit_caps_the_system_probe() {
        let settings = TransferSettings::builder()
            .memory_limit_bytes(1000)
            .max_page_size(None)
            .build()
            .unwrap();
        // empty sample counts as one byte: 1000 * 0.7
        let page_size = PageSizer::new(&settings)
            .page_size(&job_with(vec![]).await)
            .await;
        assert!(page_size <= 700);
    }
}
