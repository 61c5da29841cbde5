use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time progress of one collection job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub processed: u64,
    /// Record count measured at job start; may be an estimate.
    pub total: u64,
    pub bytes_transferred: u64,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn new(total: u64) -> Self {
        ProgressSnapshot {
            processed: 0,
            total,
            bytes_transferred: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Whole-number completion percentage, capped at 100.
    ///
    /// An empty collection is complete by definition.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let pct = (self.processed as f64 / self.total as f64 * 100.0).round();
        pct.min(100.0) as u8
    }

    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn bytes_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.bytes_transferred as f64 / secs
        } else {
            0.0
        }
    }

    /// Remaining time at the current average rate.
    ///
    /// `None` until at least one record has been copied with measurable
    /// elapsed time.
    pub fn eta(&self) -> Option<Duration> {
        if self.processed >= self.total {
            return Some(Duration::ZERO);
        }
        let rate = self.records_per_second();
        if rate <= 0.0 {
            return None;
        }
        let remaining = (self.total - self.processed) as f64 / rate;
        Some(Duration::from_secs_f64(remaining))
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}
