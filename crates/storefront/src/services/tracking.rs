//! Background forwarding of cart tracking events to the Conversions API.
//!
//! Cart handlers run synchronously against the visitor's storage snapshot, so
//! they hand events to a bounded channel and a single task relays them. A full
//! queue drops the event; tracking never slows down or fails a cart write.

use std::sync::Arc;

use tokio::sync::mpsc;

use smilepet_core::{Tracker, TrackingError, TrackingEvent};

use crate::middleware::ClientContext;
use crate::services::meta::{CapiClient, CapiRequest};

/// Events buffered before new ones are dropped.
pub const QUEUE_CAPACITY: usize = 256;

/// An event plus the request context it was raised in.
#[derive(Debug)]
pub struct QueuedEvent {
    pub event: TrackingEvent,
    pub context: ClientContext,
}

/// Create the event queue.
#[must_use]
pub fn channel() -> (mpsc::Sender<QueuedEvent>, mpsc::Receiver<QueuedEvent>) {
    mpsc::channel(QUEUE_CAPACITY)
}

/// [`Tracker`] that enqueues events for the forwarder task.
///
/// Built per request so each event carries the visitor's IP and user agent.
#[derive(Debug, Clone)]
pub struct CapiTracker {
    sender: mpsc::Sender<QueuedEvent>,
    context: ClientContext,
}

impl CapiTracker {
    #[must_use]
    pub fn new(sender: mpsc::Sender<QueuedEvent>, context: ClientContext) -> Arc<Self> {
        Arc::new(Self { sender, context })
    }
}

impl Tracker for CapiTracker {
    fn track(&self, event: TrackingEvent) -> Result<(), TrackingError> {
        self.sender
            .try_send(QueuedEvent {
                event,
                context: self.context.clone(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    TrackingError::Rejected("tracking queue full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => TrackingError::ChannelClosed,
            })
    }
}

/// Relay queued events until every sender is dropped.
pub async fn forward_events(mut receiver: mpsc::Receiver<QueuedEvent>, capi: CapiClient) {
    tracing::info!("Tracking forwarder started");

    while let Some(QueuedEvent { event, context }) = receiver.recv().await {
        let request = CapiRequest {
            event_name: Some(event.event_name),
            event_id: Some(event.event_id),
            params: Some(event.params),
            user_data: None,
            event_source_url: None,
        };

        match capi.send(request, &context).await {
            Ok(response) if response.status < 400 => {}
            Ok(response) => {
                tracing::warn!(status = response.status, "Tracking event rejected upstream");
            }
            Err(e) => tracing::warn!(error = %e, "Tracking event not delivered"),
        }
    }

    tracing::info!("Tracking forwarder stopped");
}

/// Drain whatever is queued without sending it. Used when CAPI is disabled.
pub async fn discard_events(mut receiver: mpsc::Receiver<QueuedEvent>) {
    while let Some(queued) = receiver.recv().await {
        tracing::debug!(
            event_name = %queued.event.event_name,
            params = %queued.event.params,
            "Conversions API not configured; dropping tracking event"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event() -> TrackingEvent {
        TrackingEvent {
            event_name: "AddToCart".to_string(),
            event_id: "evt".to_string(),
            params: json!({}),
        }
    }

    #[tokio::test]
    async fn test_track_enqueues_with_context() {
        let (tx, mut rx) = channel();
        let context = ClientContext {
            ip: Some("198.51.100.7".to_string()),
            ..ClientContext::default()
        };
        CapiTracker::new(tx, context).track(event()).unwrap();

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.event.event_name, "AddToCart");
        assert_eq!(queued.context.ip.as_deref(), Some("198.51.100.7"));
    }

    #[test]
    fn test_closed_channel() {
        let (tx, rx) = channel();
        drop(rx);
        let result = CapiTracker::new(tx, ClientContext::default()).track(event());
        assert!(matches!(result, Err(TrackingError::ChannelClosed)));
    }

    #[test]
    fn test_full_queue_rejects() {
        let (tx, _rx) = mpsc::channel(1);
        let tracker = CapiTracker::new(tx, ClientContext::default());
        tracker.track(event()).unwrap();
        assert!(matches!(
            tracker.track(event()),
            Err(TrackingError::Rejected(_))
        ));
    }
}
