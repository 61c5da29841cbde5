use engine_core::{error::TransferError, metrics::MetricsSnapshot};
use model::execution::job::JobState;
use serde::Serialize;
use std::time::Duration;

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub kind: &'static str,
    /// State the job was in when the error occurred.
    pub failed_in: JobState,
    pub message: String,
}

/// Terminal status of one collection job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub collection: String,
    pub state: JobState,
    /// Source count at job start; `None` if counting failed or never ran.
    pub total: Option<u64>,
    pub processed: u64,
    pub bytes_transferred: u64,
    pub page_size: Option<usize>,
    pub write_discrepancies: u64,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,
}

impl JobReport {
    pub fn failed(
        collection: impl Into<String>,
        failed_in: JobState,
        error: &TransferError,
        processed: u64,
        elapsed: Duration,
    ) -> Self {
        JobReport {
            collection: collection.into(),
            state: JobState::Failed,
            total: None,
            processed,
            bytes_transferred: 0,
            page_size: None,
            write_discrepancies: 0,
            elapsed_ms: elapsed.as_millis() as u64,
            error: Some(JobFailure {
                kind: error.kind(),
                failed_in,
                message: error.to_string(),
            }),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == JobState::Completed
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Outcome of a whole run, one report per selected collection in
/// selection order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub elapsed_ms: u64,
    pub cancelled: bool,
    pub jobs: Vec<JobReport>,
    pub metrics: MetricsSnapshot,
}

impl RunSummary {
    pub fn completed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| j.is_completed())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobReport> {
        self.jobs.iter().filter(|j| !j.is_completed())
    }

    pub fn completed_count(&self) -> usize {
        self.completed().count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(JobReport::is_completed)
    }

    pub fn job(&self, collection: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.collection == collection)
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}
