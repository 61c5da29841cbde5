use crate::sink::ProgressSink;
use async_trait::async_trait;
use model::events::{Event, transfer::TransferEvent};
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

/// A subscription handle that can be used to unsubscribe from events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    subscriber_id: u64,
}

/// Fans transfer events out to channel subscribers.
///
/// Publishing never waits on a subscriber: a full channel drops the event
/// for that subscriber and logs a warning.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<u64, mpsc::Sender<Arc<TransferEvent>>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber with a channel of `buffer` events.
    pub async fn subscribe(
        &self,
        buffer: usize,
    ) -> (Subscription, mpsc::Receiver<Arc<TransferEvent>>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let subscriber_id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers.write().await.insert(subscriber_id, tx);
        debug!(subscriber_id, buffer, "Subscribed to transfer events");

        (Subscription { subscriber_id }, rx)
    }

    pub async fn publish(&self, event: TransferEvent) {
        let event = Arc::new(event);
        let mut closed = Vec::new();

        {
            let subscribers = self.subscribers.read().await;
            if subscribers.is_empty() {
                debug!(event_type = event.event_type(), "No subscribers for event");
                return;
            }

            for (subscriber_id, sender) in subscribers.iter() {
                match sender.try_send(Arc::clone(&event)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            event_type = event.event_type(),
                            subscriber_id,
                            "Dropped event for slow subscriber (channel full)"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*subscriber_id),
                }
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for subscriber_id in closed {
                subscribers.remove(&subscriber_id);
                debug!(subscriber_id, "Removed subscriber with closed channel");
            }
        }
    }

    pub async fn unsubscribe(&self, subscription: Subscription) {
        if self
            .subscribers
            .write()
            .await
            .remove(&subscription.subscriber_id)
            .is_some()
        {
            debug!(
                subscriber_id = subscription.subscriber_id,
                "Unsubscribed from transfer events"
            );
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn clear(&self) {
        self.subscribers.write().await.clear();
        debug!("Cleared all subscriptions from EventBus");
    }
}

#[async_trait]
impl ProgressSink for EventBus {
    async fn emit(&self, event: TransferEvent) {
        self.publish(event).await;
    }
}
