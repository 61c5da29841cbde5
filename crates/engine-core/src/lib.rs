pub mod budget;
pub mod context {
    pub mod job;
}
pub mod error;
pub mod event_bus;
pub mod memory;
pub mod metrics;
pub mod progress;
pub mod reader;
pub mod sink;
pub mod writer;
