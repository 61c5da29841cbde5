use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_copied: AtomicU64,
    bytes_transferred: AtomicU64,
    batches_written: AtomicU64,
    write_discrepancies: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_failed: AtomicU64,
}

/// Run-wide counters shared between the engine and whoever reports on it.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub records_copied: u64,
    pub bytes_transferred: u64,
    pub batches_written: u64,
    /// Records submitted but not acknowledged by a target.
    pub write_discrepancies: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_records(&self, count: u64) {
        self.inner.records_copied.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_bytes(&self, count: u64) {
        self.inner
            .bytes_transferred
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner.batches_written.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_discrepancies(&self, count: u64) {
        self.inner
            .write_discrepancies
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_completed(&self) {
        self.inner.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.inner.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_copied: self.inner.records_copied.load(Ordering::Relaxed),
            bytes_transferred: self.inner.bytes_transferred.load(Ordering::Relaxed),
            batches_written: self.inner.batches_written.load(Ordering::Relaxed),
            write_discrepancies: self.inner.write_discrepancies.load(Ordering::Relaxed),
            jobs_completed: self.inner.jobs_completed.load(Ordering::Relaxed),
            jobs_failed: self.inner.jobs_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_counters() {
        let metrics = Metrics::new();
        let handle = metrics.clone();

        handle.increment_records(10);
        handle.increment_bytes(100);
        handle.increment_batches(1);
        metrics.increment_completed();
        metrics.increment_failed();

        let snap = metrics.snapshot();
        assert_eq!(snap.records_copied, 10);
        assert_eq!(snap.bytes_transferred, 100);
        assert_eq!(snap.batches_written, 1);
        assert_eq!(snap.jobs_completed, 1);
        assert_eq!(snap.jobs_failed, 1);
        assert_eq!(snap.write_discrepancies, 0);
    }
}
