//! LiFi State - Authoritative node and message state
//!
//! This crate owns the node set and the append-only message log, derives
//! each node's status from its latest message, and computes aggregate counts.
//!
//! ## Components
//!
//! - **store**: the [`MeshStore`] contract
//! - **memory**: lock-guarded in-memory store
//! - **sqlite**: SQLite persistence with sqlx
//! - **error**: state-specific error types
//!
//! ## Example
//!
//! ```ignore
//! use lifi_core::{MessageType, NodeId};
//! use lifi_state::{MeshStore, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SqliteStore::open("hq_data.db").await?;
//!     store.record_message(&NodeId::from("102a"), MessageType::Sos, "HELP!").await?;
//!     println!("{:?}", store.get_stats().await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use error::{Result, StateError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{MeshStore, DEFAULT_MESSAGE_LIMIT};
