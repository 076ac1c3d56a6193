//! Outbound command encoding
//!
//! The HQ firmware accepts one `|`-separated command per line. Encoding is
//! pure and does not validate node ids.

use lifi_core::NodeId;
use serde::{Deserialize, Serialize};

/// `BROADCAST|<content>\n`
pub fn broadcast(content: &str) -> String {
    format!("BROADCAST|{content}\n")
}

/// `TARGET|<node_id>|<content>\n`
pub fn targeted(node_id: &str, content: &str) -> String {
    format!("TARGET|{node_id}|{content}\n")
}

/// `MESSAGE|<node_id>|<content>\n`
pub fn direct_message(node_id: &str, content: &str) -> String {
    format!("MESSAGE|{node_id}|{content}\n")
}

/// `INIT|<id>\n`
pub fn init(id: &str) -> String {
    format!("INIT|{id}\n")
}

/// Something an operator wants the HQ device to transmit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Send to every node
    Broadcast {
        /// Payload
        content: String,
    },
    /// Send to one node, relayed by the mesh
    Targeted {
        /// Destination
        node_id: NodeId,
        /// Payload
        content: String,
    },
    /// Direct text message to one node
    Message {
        /// Destination
        node_id: NodeId,
        /// Payload
        content: String,
    },
    /// Set the HQ device's own id
    Init {
        /// New id
        id: NodeId,
    },
}

impl Intent {
    /// Encode as a raw command line
    pub fn encode(&self) -> String {
        match self {
            Intent::Broadcast { content } => broadcast(content),
            Intent::Targeted { node_id, content } => targeted(node_id.as_str(), content),
            Intent::Message { node_id, content } => direct_message(node_id.as_str(), content),
            Intent::Init { id } => init(id.as_str()),
        }
    }
}
