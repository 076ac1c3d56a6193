//! Broadcast channel implementation of [`EventSink`]
//!
//! Each subscriber gets its own receiver. Events sent while nobody is
//! subscribed are lost, and a subscriber that falls more than `capacity`
//! events behind skips ahead.

use lifi_core::{EventSink, LinkEvent, MessageView, NodeId};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of events buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Fans link events out to any number of subscribers
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LinkEvent>,
}

impl BroadcastSink {
    /// Create a sink buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every event sent from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Publish an event
    pub fn publish(&self, event: LinkEvent) {
        if self.tx.send(event).is_err() {
            trace!("No subscribers, event dropped");
        }
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventSink for BroadcastSink {
    fn on_message(&self, message: &MessageView) {
        self.publish(LinkEvent::NewMessage {
            message: message.clone(),
        });
    }

    fn on_sos_alert(&self, node_id: &NodeId, node_name: &str, content: &str) {
        self.publish(LinkEvent::SosAlert {
            node_id: node_id.clone(),
            node_name: node_name.to_string(),
            content: content.to_string(),
        });
    }

    fn on_connection_status(&self, connected: bool) {
        self.publish(LinkEvent::Status { connected });
    }
}
