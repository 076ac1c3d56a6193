//! The store contract consumed by the bridge and the HTTP shim

use async_trait::async_trait;
use lifi_core::{MeshStats, MessageRecord, MessageType, MessageView, Node, NodeId, NodeUpdate};

use crate::error::Result;

/// Number of messages returned when the caller gives no limit
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;

/// Authoritative node and message state.
///
/// Every call is atomic and calls are serialized inside the store, so the
/// order in which `record_message` calls land decides a node's final status.
#[async_trait]
pub trait MeshStore: Send + Sync {
    /// Record a message, creating the sender if unseen and deriving its status
    async fn record_message(
        &self,
        sender_id: &NodeId,
        message_type: MessageType,
        content: &str,
    ) -> Result<MessageRecord>;

    /// All known nodes, ordered by id
    async fn get_nodes(&self) -> Result<Vec<Node>>;

    /// One node by id
    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Apply a partial update; returns the node afterwards, or `None` if unknown
    async fn update_node(&self, id: &NodeId, update: &NodeUpdate) -> Result<Option<Node>>;

    /// Newest-first messages joined with sender names
    async fn get_messages(&self, limit: usize) -> Result<Vec<MessageView>>;

    /// Counts recomputed from current state
    async fn get_stats(&self) -> Result<MeshStats>;

    /// Drop all nodes and messages, then re-seed the HQ node
    async fn clear(&self) -> Result<()>;
}
