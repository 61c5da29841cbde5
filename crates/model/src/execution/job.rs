use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single collection job.
///
/// `Pending -> Preparing -> Copying -> Completed`, with `Failed` reachable
/// from `Pending`, `Preparing` and `Copying`. Terminal states never move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Preparing,
    Copying,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "Pending",
            JobState::Preparing => "Preparing",
            JobState::Copying => "Copying",
            JobState::Completed => "Completed",
            JobState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Pending, Preparing)
                | (Preparing, Copying)
                | (Copying, Completed)
                | (Pending, Failed)
                | (Preparing, Failed)
                | (Copying, Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
