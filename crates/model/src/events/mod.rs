use std::fmt::Debug;

pub mod progress;
pub mod transfer;

/// A trait for events that can be published to progress sinks.
pub trait Event: Send + Sync + Debug + 'static {
    /// Returns a unique identifier for this event type.
    fn event_type(&self) -> &'static str;
}
