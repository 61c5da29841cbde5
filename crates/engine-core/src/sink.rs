use async_trait::async_trait;
use model::events::{Event, transfer::TransferEvent};
use tracing::{debug, error, info};

/// Receives every event the engine emits.
///
/// Implementations must return promptly; the transfer loop awaits `emit`
/// between batches.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn emit(&self, event: TransferEvent);
}

/// Renders events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl ProgressSink for LogSink {
    async fn emit(&self, event: TransferEvent) {
        match &event {
            TransferEvent::Progress { .. } => {
                debug!(event_type = event.event_type(), "{}", event)
            }
            TransferEvent::JobFailed { .. } => {
                error!(event_type = event.event_type(), "{}", event)
            }
            _ => info!(event_type = event.event_type(), "{}", event),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl ProgressSink for NoopSink {
    async fn emit(&self, _event: TransferEvent) {}
}
