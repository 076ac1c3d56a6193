//! In-memory store guarded by a single lock

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lifi_core::{
    MeshMessage, MeshStats, MessageRecord, MessageType, MessageView, Node, NodeId, NodeStatus,
    NodeUpdate,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;
use crate::store::MeshStore;

#[derive(Debug)]
struct Inner {
    nodes: BTreeMap<NodeId, Node>,
    messages: Vec<MessageRecord>,
    next_id: i64,
}

impl Inner {
    fn seeded() -> Self {
        let mut nodes = BTreeMap::new();
        let hq = Node::headquarters(Utc::now());
        nodes.insert(hq.id.clone(), hq);
        Self {
            nodes,
            messages: Vec::new(),
            next_id: 1,
        }
    }

    /// Record timestamps never go backwards, even if the wall clock does
    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }

    fn sender_name(&self, id: &NodeId) -> String {
        self.nodes
            .get(id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

/// Volatile [`MeshStore`] for tests and runs without a database file.
///
/// Nodes and the message log sit behind one mutex, so each operation is a
/// single critical section.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create a store holding only the HQ node
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::seeded()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MeshStore for MemoryStore {
    async fn record_message(
        &self,
        sender_id: &NodeId,
        message_type: MessageType,
        content: &str,
    ) -> Result<MessageRecord> {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        let timestamp = inner.next_timestamp(now);

        let node = inner
            .nodes
            .entry(sender_id.clone())
            .or_insert_with(|| {
                debug!(node = %sender_id, "Creating node on first message");
                Node::new(sender_id.clone(), now)
            });
        node.status = if message_type.is_emergency() {
            NodeStatus::Sos
        } else {
            NodeStatus::Active
        };
        node.last_seen = Some(now);

        let id = inner.next_id;
        inner.next_id += 1;

        let message = MeshMessage::new(sender_id.clone(), message_type, content);
        let record = MessageRecord::new(id, message, timestamp);
        inner.messages.push(record.clone());
        Ok(record)
    }

    async fn get_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.inner.lock().nodes.values().cloned().collect())
    }

    async fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        Ok(self.inner.lock().nodes.get(id).cloned())
    }

    async fn update_node(&self, id: &NodeId, update: &NodeUpdate) -> Result<Option<Node>> {
        let mut inner = self.inner.lock();
        Ok(inner.nodes.get_mut(id).map(|node| {
            update.apply_to(node, Utc::now());
            node.clone()
        }))
    }

    async fn get_messages(&self, limit: usize) -> Result<Vec<MessageView>> {
        let inner = self.inner.lock();
        // The log is appended in timestamp order, so reverse order is newest-first.
        Ok(inner
            .messages
            .iter()
            .rev()
            .take(limit)
            .map(|record| MessageView::new(record.clone(), inner.sender_name(&record.sender_id)))
            .collect())
    }

    async fn get_stats(&self) -> Result<MeshStats> {
        let inner = self.inner.lock();
        let count_status = |status: NodeStatus| {
            inner.nodes.values().filter(|n| n.status == status).count() as u64
        };
        Ok(MeshStats {
            total_nodes: inner.nodes.len() as u64,
            active_nodes: count_status(NodeStatus::Active),
            sos_nodes: count_status(NodeStatus::Sos),
            total_messages: inner.messages.len() as u64,
            sos_count: inner.messages.iter().filter(|m| m.is_emergency).count() as u64,
        })
    }

    async fn clear(&self) -> Result<()> {
        *self.inner.lock() = Inner::seeded();
        Ok(())
    }
}
