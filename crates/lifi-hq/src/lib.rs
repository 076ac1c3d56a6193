//! LiFi HQ - bridge server for the mesh headquarters device
//!
//! Wires the serial link, the store and the event fan-out together and
//! exposes them over HTTP:
//! - REST API for nodes, messages, statistics and serial ports
//! - WebSocket feed of link events, plus device control commands

pub mod server;

use lifi_link::{BroadcastSink, HqBridge, LinkConfig, LinkConnection};
use lifi_state::MeshStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state shared across handlers
pub struct AppState {
    /// Node and message store
    pub store: Arc<dyn MeshStore>,
    /// Link events for WebSocket clients
    pub events: BroadcastSink,
    /// The device link; holding the lock serializes connect and disconnect
    pub link: Mutex<LinkConnection>,
}

impl AppState {
    /// Build the state: the link records into `store` and publishes to `events`
    pub fn new(store: Arc<dyn MeshStore>, config: LinkConfig) -> Self {
        let events = BroadcastSink::default();
        let bridge = Arc::new(HqBridge::new(store.clone(), Arc::new(events.clone())));

        Self {
            store,
            link: Mutex::new(LinkConnection::new(config, bridge)),
            events,
        }
    }
}
