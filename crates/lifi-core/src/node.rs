//! Mesh node identity, status and partial updates

use crate::error::{LifiError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Length of a node identifier in characters
pub const NODE_ID_LEN: usize = 4;

/// Identifier of the headquarters node
pub const HQ_ID: &str = "000h";

/// Display name of the headquarters node
pub const HQ_NAME: &str = "Headquarters";

/// Fixed latitude of the headquarters node
pub const HQ_LATITUDE: f64 = 22.5726;

/// Fixed longitude of the headquarters node
pub const HQ_LONGITUDE: f64 = 88.3639;

/// Identifier of a mesh node: a 4-character code such as `102a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID, rejecting anything that is not exactly 4 characters
    pub fn parse(id: &str) -> Result<Self> {
        if id.chars().count() == NODE_ID_LEN {
            Ok(Self(id.to_string()))
        } else {
            Err(LifiError::InvalidNodeId(id.to_string()))
        }
    }

    /// The headquarters node ID
    pub fn hq() -> Self {
        Self(HQ_ID.to_string())
    }

    /// Get the node ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Derived status of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    /// Never heard from
    #[default]
    Unknown,
    /// Last message was a normal one
    Active,
    /// Last message was an emergency
    Sos,
}

impl NodeStatus {
    /// Lowercase name, as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Unknown => "unknown",
            NodeStatus::Active => "active",
            NodeStatus::Sos => "sos",
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = LifiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unknown" => Ok(NodeStatus::Unknown),
            "active" => Ok(NodeStatus::Active),
            "sos" => Ok(NodeStatus::Sos),
            other => Err(LifiError::InvalidNodeStatus(other.to_string())),
        }
    }
}

/// A relay node in the mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique 4-character identifier
    pub id: NodeId,
    /// Human-readable name
    pub name: String,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
    /// Status derived from the most recent message
    pub status: NodeStatus,
    /// When the node was last heard from or edited
    pub last_seen: Option<DateTime<Utc>>,
}

impl Node {
    /// Create a node first seen at `now`, with the default display name
    pub fn new(id: NodeId, now: DateTime<Utc>) -> Self {
        Self {
            name: Self::default_name(&id),
            id,
            latitude: None,
            longitude: None,
            status: NodeStatus::Unknown,
            last_seen: Some(now),
        }
    }

    /// The bootstrap headquarters node
    pub fn headquarters(now: DateTime<Utc>) -> Self {
        Self {
            id: NodeId::hq(),
            name: HQ_NAME.to_string(),
            latitude: Some(HQ_LATITUDE),
            longitude: Some(HQ_LONGITUDE),
            status: NodeStatus::Active,
            last_seen: Some(now),
        }
    }

    /// Name given to nodes created implicitly from traffic
    pub fn default_name(id: &NodeId) -> String {
        format!("Node {}", id)
    }
}

/// Partial update of a node's editable fields.
///
/// Only these four fields are recognized. Unknown keys in a JSON body are
/// ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeUpdate {
    /// New display name
    pub name: Option<String>,
    /// New latitude
    pub latitude: Option<f64>,
    /// New longitude
    pub longitude: Option<f64>,
    /// Status override
    pub status: Option<NodeStatus>,
}

impl NodeUpdate {
    /// Whether no recognized field is present
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.status.is_none()
    }

    /// Apply the present fields to `node` and refresh `last_seen`.
    ///
    /// Returns `false` without touching the node when the update is empty.
    pub fn apply_to(&self, node: &mut Node, now: DateTime<Utc>) -> bool {
        if self.is_empty() {
            return false;
        }
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(latitude) = self.latitude {
            node.latitude = Some(latitude);
        }
        if let Some(longitude) = self.longitude {
            node.longitude = Some(longitude);
        }
        if let Some(status) = self.status {
            node.status = status;
        }
        node.last_seen = Some(now);
        true
    }
}
