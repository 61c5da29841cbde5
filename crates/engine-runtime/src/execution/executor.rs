use crate::{
    error::RunError,
    execution::sizing::PageSizer,
    report::{JobReport, RunSummary},
};
use engine_config::settings::TransferSettings;
use engine_core::{
    context::job::{CollectionJob, CollectionPair},
    error::TransferError,
    memory::MemoryProbe,
    metrics::Metrics,
    progress::ProgressTracker,
    reader::PageReader,
    sink::{LogSink, ProgressSink},
    writer::BatchWriter,
};
use futures::TryStreamExt;
use model::execution::job::JobState;
use std::{collections::HashSet, pin::pin, sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Copies collections one after another, replacing each target.
///
/// A failing job is recorded and the run moves on to the next one.
pub struct TransferEngine {
    sizer: PageSizer,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    metrics: Metrics,
}

/// Mutable bookkeeping for the job in flight.
struct JobRun {
    collection: String,
    state: JobState,
    total: Option<u64>,
    page_size: Option<usize>,
    processed: u64,
    bytes: u64,
    discrepancies: u64,
}

impl JobRun {
    fn new(collection: &str) -> Self {
        JobRun {
            collection: collection.to_string(),
            state: JobState::Pending,
            total: None,
            page_size: None,
            processed: 0,
            bytes: 0,
            discrepancies: 0,
        }
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(collection = %self.collection, from = %self.state, to = %next, "Job state changed");
        self.state = next;
    }

    /// `failure` carries the error and the state it interrupted.
    fn into_report(
        self,
        started: Instant,
        failure: Option<(&TransferError, JobState)>,
    ) -> JobReport {
        let elapsed = started.elapsed();
        match failure {
            Some((err, failed_in)) => JobReport {
                total: self.total,
                page_size: self.page_size,
                bytes_transferred: self.bytes,
                write_discrepancies: self.discrepancies,
                ..JobReport::failed(self.collection, failed_in, err, self.processed, elapsed)
            },
            None => JobReport {
                collection: self.collection,
                state: self.state,
                total: self.total,
                processed: self.processed,
                bytes_transferred: self.bytes,
                page_size: self.page_size,
                write_discrepancies: self.discrepancies,
                elapsed_ms: elapsed.as_millis() as u64,
                error: None,
            },
        }
    }
}

impl TransferEngine {
    pub fn new(settings: &TransferSettings) -> Self {
        TransferEngine {
            sizer: PageSizer::new(settings),
            sink: Arc::new(LogSink),
            cancel: CancellationToken::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.sizer = self.sizer.with_probe(probe);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Runs every pair in order and reports each job's terminal state.
    ///
    /// Only an unusable selection fails the run itself. Once cancellation is
    /// observed, the job in flight stops before its next read and every job
    /// not yet started is reported failed without its target being touched.
    /// The summary is marked cancelled only if some job was actually stopped.
    pub async fn run(&self, pairs: Vec<CollectionPair>) -> Result<RunSummary, RunError> {
        if pairs.is_empty() {
            warn!("No collections selected; nothing to transfer");
            return Err(RunError::NoJobs);
        }
        {
            let mut seen = HashSet::new();
            if let Some(dup) = pairs.iter().find(|p| !seen.insert(p.name.as_str())) {
                return Err(RunError::DuplicateCollection(dup.name.clone()));
            }
        }

        let run_id = Uuid::new_v4().to_string();
        let run_started = Instant::now();
        let total_jobs = pairs.len();
        let mut tracker = ProgressTracker::new(run_id.clone(), Arc::clone(&self.sink));

        info!(run_id = %run_id, collections = total_jobs, "Starting transfer run");
        tracker
            .on_run_start(pairs.iter().map(|p| p.name.clone()).collect())
            .await;

        let mut jobs = Vec::with_capacity(total_jobs);
        let mut cancelled = false;
        for (idx, pair) in pairs.into_iter().enumerate() {
            let started = Instant::now();
            let mut run = JobRun::new(&pair.name);

            let outcome = if self.cancel.is_cancelled() {
                Err(TransferError::Cancelled {
                    collection: pair.name.clone(),
                    processed: 0,
                })
            } else {
                info!(
                    collection = %pair.name,
                    job = idx + 1,
                    of = total_jobs,
                    "Processing collection"
                );
                self.run_job(pair, &mut run, &mut tracker).await
            };

            let report = match outcome {
                Ok(()) => {
                    self.metrics.increment_completed();
                    run.into_report(started, None)
                }
                Err(err) => {
                    let failed_in = run.state;
                    run.transition(JobState::Failed);
                    tracker.on_job_failed(&run.collection, &err).await;
                    if err.is_cancelled() {
                        cancelled = true;
                        warn!(collection = %run.collection, state = %failed_in, "Job cancelled");
                    } else {
                        error!(
                            collection = %run.collection,
                            state = %failed_in,
                            processed = run.processed,
                            error = %err,
                            "Job failed"
                        );
                    }
                    self.metrics.increment_failed();
                    run.into_report(started, Some((&err, failed_in)))
                }
            };
            jobs.push(report);
        }

        let summary = RunSummary {
            run_id,
            elapsed_ms: run_started.elapsed().as_millis() as u64,
            cancelled,
            jobs,
            metrics: self.metrics.snapshot(),
        };

        tracker
            .on_run_complete(
                summary.completed_count(),
                summary.failed_count(),
                summary.elapsed_ms,
            )
            .await;
        info!(
            run_id = %summary.run_id,
            completed = summary.completed_count(),
            failed = summary.failed_count(),
            records = summary.metrics.records_copied,
            duration_ms = summary.elapsed_ms,
            "Transfer run finished"
        );

        Ok(summary)
    }

    async fn run_job(
        &self,
        pair: CollectionPair,
        run: &mut JobRun,
        tracker: &mut ProgressTracker,
    ) -> Result<(), TransferError> {
        run.transition(JobState::Preparing);

        let job = CollectionJob::open(pair).await?;
        run.total = Some(job.estimated_total());

        let page_size = self.sizer.page_size(&job).await;
        run.page_size = Some(page_size);

        let writer = BatchWriter::new(&job).prepare().await?;
        tracker.on_job_start(&job, page_size).await;

        run.transition(JobState::Copying);
        info!(
            collection = %job.name(),
            total = job.estimated_total(),
            page_size,
            cleared = writer.cleared(),
            "Copying collection"
        );

        if job.estimated_total() == 0 {
            debug!(collection = %job.name(), "Source is empty; skipping reads");
        } else {
            let reader = PageReader::new(&job);
            let mut pages = pin!(reader.pages(page_size));

            loop {
                if self.cancel.is_cancelled() {
                    return Err(TransferError::Cancelled {
                        collection: job.name().to_string(),
                        processed: run.processed,
                    });
                }

                let Some(batch) = pages.try_next().await? else {
                    break;
                };

                let read = batch.len();
                let result = writer.write_batch(batch).await?;

                run.processed += read as u64;
                run.bytes += result.bytes;
                run.discrepancies += result.discrepancy() as u64;

                self.metrics.increment_records(read as u64);
                self.metrics.increment_bytes(result.bytes);
                self.metrics.increment_batches(1);
                self.metrics
                    .increment_discrepancies(result.discrepancy() as u64);

                tracker.on_batch_copied(&job, read, result.bytes).await;

                // A short page drained the source; a late cancel must not fail the job.
                if read < page_size {
                    break;
                }
            }
        }

        run.transition(JobState::Completed);
        let snapshot = tracker.on_job_complete(&job).await;
        info!(
            collection = %job.name(),
            records = snapshot.processed,
            bytes = snapshot.bytes_transferred,
            duration_ms = snapshot.elapsed.as_millis(),
            records_per_sec = %format!("{:.2}", snapshot.records_per_second()),
            "Collection copied"
        );

        Ok(())
    }
}
