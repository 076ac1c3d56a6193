//! LiFi Core - Data model shared by the HQ bridge crates
//!
//! This crate defines what the rest of the workspace passes around: mesh
//! nodes and their derived status, decoded and stored messages, aggregate
//! statistics, and the events the bridge publishes.
//!
//! # Modules
//!
//! - [`node`] - Node identity, status, partial updates, HQ constants
//! - [`message`] - Message types, decoded frames, stored records
//! - [`stats`] - Aggregate counts
//! - [`event`] - Link events and the [`EventSink`] contract
//! - [`error`] - Data model errors
//!
//! # Example
//!
//! ```rust
//! use lifi_core::{MeshMessage, MessageType};
//!
//! let msg = MeshMessage::new("102a", MessageType::Sos, "HELP!");
//! assert!(msg.is_emergency());
//! assert_eq!(msg.message_type.label(), "SOS");
//! ```

pub mod error;
pub mod event;
pub mod message;
pub mod node;
pub mod stats;

pub use error::{LifiError, Result};
pub use event::{EventSink, LinkEvent, NoopSink};
pub use message::{MeshMessage, MessageRecord, MessageType, MessageView};
pub use node::{
    Node, NodeId, NodeStatus, NodeUpdate, HQ_ID, HQ_LATITUDE, HQ_LONGITUDE, HQ_NAME, NODE_ID_LEN,
};
pub use stats::MeshStats;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
