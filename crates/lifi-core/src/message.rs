//! Message types carried over the mesh

use crate::error::{LifiError, Result};
use crate::node::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of messages in the mesh, encoded on the wire as one digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum MessageType {
    /// HQ → all lamps, gradient setup
    Init = 0,
    /// HQ → all lamps
    Broadcast = 1,
    /// HQ → one lamp
    Targeted = 2,
    /// Lamp → HQ emergency
    Sos = 3,
    /// Node → HQ
    Message = 4,
}

impl MessageType {
    /// Numeric wire code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Wire digit character
    pub fn digit(self) -> char {
        char::from(b'0' + self.code())
    }

    /// Parse a single wire digit
    pub fn from_digit(digit: char) -> Option<Self> {
        let code = digit.to_digit(10)?;
        Self::try_from(code as u8).ok()
    }

    /// Upper-case label shown to operators
    pub fn label(self) -> &'static str {
        match self {
            MessageType::Init => "INIT",
            MessageType::Broadcast => "BROADCAST",
            MessageType::Targeted => "TARGETED",
            MessageType::Sos => "SOS",
            MessageType::Message => "MESSAGE",
        }
    }

    /// Whether this type raises an emergency
    pub fn is_emergency(self) -> bool {
        self == MessageType::Sos
    }
}

impl TryFrom<u8> for MessageType {
    type Error = LifiError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(MessageType::Init),
            1 => Ok(MessageType::Broadcast),
            2 => Ok(MessageType::Targeted),
            3 => Ok(MessageType::Sos),
            4 => Ok(MessageType::Message),
            other => Err(LifiError::InvalidMessageType(other.to_string())),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(t: MessageType) -> Self {
        t.code()
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A message decoded from one serial frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshMessage {
    /// Originating node
    pub sender_id: NodeId,
    /// Message type
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Text payload (may be empty)
    pub content: String,
}

impl MeshMessage {
    /// Create a new mesh message
    pub fn new(
        sender_id: impl Into<NodeId>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            sender_id: sender_id.into(),
            message_type,
            content: content.into(),
        }
    }

    /// Whether this is an emergency message
    pub fn is_emergency(&self) -> bool {
        self.message_type.is_emergency()
    }
}

/// A message as stored in the append-only log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Monotonically increasing identifier
    pub id: i64,
    /// Originating node
    pub sender_id: NodeId,
    /// Message type
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Text payload
    pub content: String,
    /// True iff the type is SOS
    pub is_emergency: bool,
    /// Assigned when recorded
    pub timestamp: DateTime<Utc>,
}

impl MessageRecord {
    /// Build a record for `message`, stamped with `id` and `timestamp`
    pub fn new(id: i64, message: MeshMessage, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            is_emergency: message.is_emergency(),
            sender_id: message.sender_id,
            message_type: message.message_type,
            content: message.content,
            timestamp,
        }
    }
}

/// A stored message joined with its sender's current name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    /// The stored record
    #[serde(flatten)]
    pub record: MessageRecord,
    /// Sender's display name at read time
    pub sender_name: String,
    /// Human-readable type label
    pub type_label: String,
}

impl MessageView {
    /// Join a record with the sender's current display name
    pub fn new(record: MessageRecord, sender_name: impl Into<String>) -> Self {
        Self {
            type_label: record.message_type.label().to_string(),
            sender_name: sender_name.into(),
            record,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits() {
        assert_eq!(MessageType::from_digit('3'), Some(MessageType::Sos));
        assert_eq!(MessageType::from_digit('0'), Some(MessageType::Init));
        assert_eq!(MessageType::from_digit('5'), None);
        assert_eq!(MessageType::from_digit('x'), None);
        assert_eq!(MessageType::Message.digit(), '4');
    }

    #[test]
    fn test_labels() {
        assert_eq!(MessageType::Broadcast.label(), "BROADCAST");
        assert_eq!(MessageType::Targeted.label(), "TARGETED");
        assert_eq!(MessageType::Sos.to_string(), "SOS");
    }

    #[test]
    fn test_emergency_flag() {
        let sos = MeshMessage::new("102a", MessageType::Sos, "HELP!");
        assert!(MessageRecord::new(1, sos, Utc::now()).is_emergency);

        let normal = MeshMessage::new("102a", MessageType::Message, "hi");
        assert!(!MessageRecord::new(2, normal, Utc::now()).is_emergency);
    }

    #[test]
    fn test_view_serializes_flat() {
        let message = MeshMessage::new("102a", MessageType::Sos, "HELP!");
        let record = MessageRecord::new(7, message, Utc::now());
        let view = MessageView::new(record, "Node 102a");
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["sender_id"], "102a");
        assert_eq!(json["type"], 3);
        assert_eq!(json["type_label"], "SOS");
        assert_eq!(json["sender_name"], "Node 102a");
        assert_eq!(json["is_emergency"], true);
    }

    #[test]
    fn test_type_rejects_out_of_range() {
        assert!(serde_json::from_str::<MessageType>("9").is_err());
        let parsed: MessageType = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, MessageType::Targeted);
    }
}
