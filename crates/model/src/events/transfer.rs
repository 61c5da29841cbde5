use crate::events::{Event, progress::ProgressSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything the transfer engine reports while a run is in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    // === Run Lifecycle ===
    /// Emitted once before the first job starts
    RunStarted {
        run_id: String,
        collections: Vec<String>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted once after every job reached a terminal state
    RunCompleted {
        run_id: String,
        completed: usize,
        failed: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    // === Job Lifecycle ===
    /// Emitted when a collection job has been sized and its target cleared
    JobStarted {
        run_id: String,
        collection: String,
        total: u64,
        page_size: usize,
        timestamp: DateTime<Utc>,
    },

    /// Emitted after every batch that reached the target
    Progress {
        run_id: String,
        collection: String,
        snapshot: ProgressSnapshot,
        percentage: u8,
        records_per_second: f64,
        eta_seconds: Option<u64>,
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a job copied every record
    JobCompleted {
        run_id: String,
        collection: String,
        processed: u64,
        bytes_transferred: u64,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a job stopped on a read, write or cancellation error
    JobFailed {
        run_id: String,
        collection: String,
        error: String,
        processed: u64,
        timestamp: DateTime<Utc>,
    },
}

impl TransferEvent {
    pub fn run_id(&self) -> &str {
        match self {
            TransferEvent::RunStarted { run_id, .. }
            | TransferEvent::RunCompleted { run_id, .. }
            | TransferEvent::JobStarted { run_id, .. }
            | TransferEvent::Progress { run_id, .. }
            | TransferEvent::JobCompleted { run_id, .. }
            | TransferEvent::JobFailed { run_id, .. } => run_id,
        }
    }

    /// The collection the event belongs to; `None` for run-level events.
    pub fn collection(&self) -> Option<&str> {
        match self {
            TransferEvent::JobStarted { collection, .. }
            | TransferEvent::Progress { collection, .. }
            | TransferEvent::JobCompleted { collection, .. }
            | TransferEvent::JobFailed { collection, .. } => Some(collection),
            TransferEvent::RunStarted { .. } | TransferEvent::RunCompleted { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::JobCompleted { .. } | TransferEvent::JobFailed { .. }
        )
    }
}

impl Event for TransferEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::RunStarted { .. } => "run.started",
            TransferEvent::RunCompleted { .. } => "run.completed",
            TransferEvent::JobStarted { .. } => "job.started",
            TransferEvent::Progress { .. } => "job.progress",
            TransferEvent::JobCompleted { .. } => "job.completed",
            TransferEvent::JobFailed { .. } => "job.failed",
        }
    }
}

impl fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferEvent::RunStarted {
                run_id,
                collections,
                timestamp,
            } => write!(
                f,
                "[{}] Transfer started: {} collection(s): {} (run={})",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                collections.len(),
                collections.join(", "),
                run_id
            ),

            TransferEvent::RunCompleted {
                run_id,
                completed,
                failed,
                duration_ms,
                timestamp,
            } => write!(
                f,
                "[{}] Transfer finished: {} completed, {} failed in {}ms (run={})",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                completed,
                failed,
                duration_ms,
                run_id
            ),

            TransferEvent::JobStarted {
                collection,
                total,
                page_size,
                timestamp,
                ..
            } => write!(
                f,
                "[{}] Copying {}: {} record(s), {} per page",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                collection,
                total,
                page_size
            ),

            TransferEvent::Progress {
                collection,
                snapshot,
                percentage,
                records_per_second,
                eta_seconds,
                timestamp,
                ..
            } => {
                let eta = eta_seconds
                    .map(|s| format!("{s}s"))
                    .unwrap_or_else(|| "N/A".to_string());
                write!(
                    f,
                    "[{}] {}: {}/{} records ({}%) @ {:.0} records/s, eta {}",
                    timestamp.format("%Y-%m-%d %H:%M:%S"),
                    collection,
                    snapshot.processed,
                    snapshot.total,
                    percentage,
                    records_per_second,
                    eta
                )
            }

            TransferEvent::JobCompleted {
                collection,
                processed,
                duration_ms,
                timestamp,
                ..
            } => write!(
                f,
                "[{}] Copied {}: {} record(s) in {}ms",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                collection,
                processed,
                duration_ms
            ),

            TransferEvent::JobFailed {
                collection,
                error,
                processed,
                timestamp,
                ..
            } => write!(
                f,
                "[{}] Failed {}: {} (after {} record(s))",
                timestamp.format("%Y-%m-%d %H:%M:%S"),
                collection,
                error,
                processed
            ),
        }
    }
}
