pub mod error;
pub mod execution {
    pub mod executor;
    pub mod sizing;
}
pub mod report;

pub use execution::executor::TransferEngine;
pub use report::{JobReport, RunSummary};
