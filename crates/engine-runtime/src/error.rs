use thiserror::Error;

/// Errors that stop a run before any job starts.
///
/// Failures inside a job never surface here; they are recorded on that
/// job's report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No collections selected for transfer")]
    NoJobs,

    #[error("Collection '{0}' selected more than once")]
    DuplicateCollection(String),
}
