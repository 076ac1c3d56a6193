//! HqBridge - recording path between the reader and the rest of the system
//!
//! Every line the reader produces goes through here:
//!
//! ```text
//! ┌──────────┐   line   ┌───────────┐  MeshMessage  ┌───────────┐
//! │  Reader  │─────────►│  parser   │──────────────►│ MeshStore │
//! └──────────┘          └───────────┘               └─────┬─────┘
//!                                                         │ MessageView
//!                                                   ┌─────▼─────┐
//!                                                   │ EventSink │
//!                                                   └───────────┘
//! ```
//!
//! The bridge records the message, then notifies the sink with the stored
//! view and, for SOS, an alert carrying the sender's current name. A store
//! failure is logged and the event is skipped. Nothing here stops the reader.

use lifi_core::{EventSink, MeshMessage, MessageView};
use lifi_state::MeshStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

use crate::parser::parse_line;

/// Bridge statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Non-empty lines handed to the parser
    pub lines_received: u64,
    /// Lines that carried no message
    pub lines_dropped: u64,
    /// Messages recorded and published
    pub messages_recorded: u64,
    /// SOS alerts raised
    pub sos_alerts: u64,
    /// Recording attempts the store rejected
    pub store_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    lines_received: AtomicU64,
    lines_dropped: AtomicU64,
    messages_recorded: AtomicU64,
    sos_alerts: AtomicU64,
    store_errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            lines_received: self.lines_received.load(Ordering::Relaxed),
            lines_dropped: self.lines_dropped.load(Ordering::Relaxed),
            messages_recorded: self.messages_recorded.load(Ordering::Relaxed),
            sos_alerts: self.sos_alerts.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

/// Records decoded frames and publishes them
pub struct HqBridge {
    store: Arc<dyn MeshStore>,
    sink: Arc<dyn EventSink>,
    counters: Counters,
}

impl HqBridge {
    /// Create a bridge over a store and a sink
    pub fn new(store: Arc<dyn MeshStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            store,
            sink,
            counters: Counters::default(),
        }
    }

    /// The store messages are recorded in
    pub fn store(&self) -> &Arc<dyn MeshStore> {
        &self.store
    }

    /// The sink notifications go to
    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Current counters
    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    /// Parse a line and record it if it carries a message
    pub async fn handle_line(&self, line: &str) -> Option<MessageView> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        Counters::bump(&self.counters.lines_received);
        trace!(line, "Received line");

        match parse_line(line) {
            Some(message) => self.handle_message(message).await,
            None => {
                Counters::bump(&self.counters.lines_dropped);
                trace!(line, "Line carries no message");
                None
            }
        }
    }

    /// Record a decoded message and notify the sink
    pub async fn handle_message(&self, message: MeshMessage) -> Option<MessageView> {
        let record = match self
            .store
            .record_message(&message.sender_id, message.message_type, &message.content)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                Counters::bump(&self.counters.store_errors);
                error!(
                    error = %e,
                    code = e.error_code(),
                    sender = %message.sender_id,
                    "Failed to record message"
                );
                return None;
            }
        };

        let sender_name = match self.store.get_node(&record.sender_id).await {
            Ok(Some(node)) => node.name,
            Ok(None) => record.sender_id.to_string(),
            Err(e) => {
                warn!(error = %e, sender = %record.sender_id, "Failed to look up sender name");
                record.sender_id.to_string()
            }
        };

        let view = MessageView::new(record, sender_name);
        Counters::bump(&self.counters.messages_recorded);
        debug!(
            id = view.record.id,
            sender = %view.record.sender_id,
            kind = %view.type_label,
            "Recorded message"
        );

        self.sink.on_message(&view);

        if view.record.is_emergency {
            Counters::bump(&self.counters.sos_alerts);
            warn!(
                node = %view.record.sender_id,
                name = %view.sender_name,
                content = %view.record.content,
                "SOS received"
            );
            self.sink.on_sos_alert(
                &view.record.sender_id,
                &view.sender_name,
                &view.record.content,
            );
        }

        Some(view)
    }
}

impl std::fmt::Debug for HqBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HqBridge")
            .field("stats", &self.stats())
            .finish()
    }
}
