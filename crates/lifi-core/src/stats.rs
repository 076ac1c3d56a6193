//! Aggregate counts over the node set and message log

use serde::{Deserialize, Serialize};

/// Point-in-time counts recomputed from current state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStats {
    /// Number of known nodes
    pub total_nodes: u64,
    /// Nodes whose status is `active`
    pub active_nodes: u64,
    /// Nodes whose status is `sos`
    pub sos_nodes: u64,
    /// Length of the message log
    pub total_messages: u64,
    /// Emergency messages in the log
    pub sos_count: u64,
}
