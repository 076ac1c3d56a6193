//! LiFi Link - serial bridge to the LiFi mesh HQ device
//!
//! This crate connects to the headquarters device of a LiFi relay mesh over
//! a serial port, decodes the text frames field nodes send through it,
//! records them in a [`MeshStore`](lifi_state::MeshStore) and publishes the
//! results through an [`EventSink`](lifi_core::EventSink).
//!
//! # Architecture
//!
//! 1. **Discovery** - pick the serial port whose description names a known chip
//! 2. **Link** - open the port, run one background reader, accept sends
//! 3. **Codec** - parse inbound lines, encode outbound commands
//! 4. **Bridge** - record each message, notify the sink, raise SOS alerts
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lifi_link::{BroadcastSink, HqBridge, LinkConfig, LinkConnection};
//! use lifi_state::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sink = Arc::new(BroadcastSink::default());
//!     let mut events = sink.subscribe();
//!
//!     let bridge = Arc::new(HqBridge::new(Arc::new(MemoryStore::new()), sink));
//!     let mut link = LinkConnection::new(LinkConfig::default(), bridge);
//!
//!     // Discovers the device when no port is given
//!     link.connect(None).await?;
//!     link.send_broadcast("drill at noon").await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Wire Format
//!
//! Inbound, one frame per line:
//!
//! | Frame              | Example        | Result                       |
//! |--------------------|----------------|------------------------------|
//! | generic            | `102a 3 HELP!` | sender `102a`, SOS, `HELP!`  |
//! | header-only SOS    | `102a000h3`    | sender `102a`, SOS, `SOS`    |
//! | status/diagnostic  | `READY|v3`     | dropped                      |
//!
//! Outbound: `BROADCAST|<content>`, `TARGET|<id>|<content>`,
//! `MESSAGE|<id>|<content>` and `INIT|<id>`, each newline-terminated.
//!
//! # Features
//!
//! - `libudev` - enumerate ports through libudev (requires `libudev-dev` on Linux)

pub mod bridge;
pub mod config;
pub mod discovery;
pub mod encoder;
pub mod error;
pub mod interface;
pub mod parser;
pub mod sink;
pub mod test_utils;

pub use bridge::{BridgeStats, HqBridge};
pub use config::{LinkConfig, LinkConfigBuilder, DEFAULT_BAUD_RATE};
pub use discovery::{
    discover, find_device, list_ports, select_port, PortDescriptor, DEFAULT_DEVICE_IDENTIFIERS,
};
pub use encoder::Intent;
pub use error::{LinkError, Result};
pub use interface::{ConnectionState, LineBuffer, LinkConnection};
pub use parser::parse_line;
pub use sink::BroadcastSink;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
