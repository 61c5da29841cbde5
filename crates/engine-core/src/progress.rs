use crate::{context::job::CollectionJob, error::TransferError, sink::ProgressSink};
use chrono::Utc;
use model::events::{progress::ProgressSnapshot, transfer::TransferEvent};
use std::{sync::Arc, time::Instant};
use tracing::warn;

struct JobProgress {
    collection: String,
    snapshot: ProgressSnapshot,
    started: Instant,
    overrun_reported: bool,
}

impl JobProgress {
    fn new(job: &CollectionJob) -> Self {
        JobProgress {
            collection: job.name().to_string(),
            snapshot: ProgressSnapshot::new(job.estimated_total()),
            started: Instant::now(),
            overrun_reported: false,
        }
    }
}

/// Turns per-batch counts into progress events for one run.
///
/// Tracks a single job at a time; jobs within a run are sequential.
pub struct ProgressTracker {
    run_id: String,
    sink: Arc<dyn ProgressSink>,
    current: Option<JobProgress>,
}

impl ProgressTracker {
    pub fn new(run_id: impl Into<String>, sink: Arc<dyn ProgressSink>) -> Self {
        ProgressTracker {
            run_id: run_id.into(),
            sink,
            current: None,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub async fn on_run_start(&self, collections: Vec<String>) {
        self.sink
            .emit(TransferEvent::RunStarted {
                run_id: self.run_id.clone(),
                collections,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn on_run_complete(&self, completed: usize, failed: usize, duration_ms: u64) {
        self.sink
            .emit(TransferEvent::RunCompleted {
                run_id: self.run_id.clone(),
                completed,
                failed,
                duration_ms,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn on_job_start(&mut self, job: &CollectionJob, page_size: usize) {
        self.current = Some(JobProgress::new(job));

        self.sink
            .emit(TransferEvent::JobStarted {
                run_id: self.run_id.clone(),
                collection: job.name().to_string(),
                total: job.estimated_total(),
                page_size,
                timestamp: Utc::now(),
            })
            .await;
    }

    /// Adds one copied batch and emits the resulting snapshot.
    pub async fn on_batch_copied(
        &mut self,
        job: &CollectionJob,
        records: usize,
        bytes: u64,
    ) -> ProgressSnapshot {
        let progress = self.progress_for(job);
        progress.snapshot.processed += records as u64;
        progress.snapshot.bytes_transferred += bytes;
        progress.snapshot.elapsed = progress.started.elapsed();

        let snapshot = progress.snapshot;
        if snapshot.processed > snapshot.total && !progress.overrun_reported {
            progress.overrun_reported = true;
            warn!(
                collection = %job.name(),
                processed = snapshot.processed,
                total = snapshot.total,
                "Source grew during transfer; copied more records than counted"
            );
        }

        self.sink
            .emit(TransferEvent::Progress {
                run_id: self.run_id.clone(),
                collection: job.name().to_string(),
                snapshot,
                percentage: snapshot.percentage(),
                records_per_second: snapshot.records_per_second(),
                eta_seconds: snapshot.eta().map(|eta| eta.as_secs()),
                timestamp: Utc::now(),
            })
            .await;

        snapshot
    }

    pub async fn on_job_complete(&mut self, job: &CollectionJob) -> ProgressSnapshot {
        let progress = self.progress_for(job);
        progress.snapshot.elapsed = progress.started.elapsed();
        let snapshot = progress.snapshot;
        self.current = None;

        self.sink
            .emit(TransferEvent::JobCompleted {
                run_id: self.run_id.clone(),
                collection: job.name().to_string(),
                processed: snapshot.processed,
                bytes_transferred: snapshot.bytes_transferred,
                duration_ms: snapshot.elapsed.as_millis() as u64,
                timestamp: Utc::now(),
            })
            .await;

        snapshot
    }

    /// Reports a failed job. `collection` may not have reached
    /// [`on_job_start`](Self::on_job_start), e.g. when counting failed.
    pub async fn on_job_failed(&mut self, collection: &str, error: &TransferError) -> u64 {
        let processed = match self.current.take() {
            Some(progress) if progress.collection == collection => progress.snapshot.processed,
            _ => 0,
        };

        self.sink
            .emit(TransferEvent::JobFailed {
                run_id: self.run_id.clone(),
                collection: collection.to_string(),
                error: error.to_string(),
                processed,
                timestamp: Utc::now(),
            })
            .await;

        processed
    }

    fn progress_for(&mut self, job: &CollectionJob) -> &mut JobProgress {
        if self
            .current
            .as_ref()
            .is_none_or(|p| p.collection != job.name())
        {
            self.current = None;
        }
        self.current.get_or_insert_with(|| JobProgress::new(job))
    }
}
