//! Frame parser for lines read from the HQ device
//!
//! Two firmware generations share the serial line:
//!
//! - **Header frames**: one 9-character token. Characters 1-4 are the sender,
//!   5-8 the receiver and the 9th the type digit. Only SOS headers (`3`) are
//!   turned into messages.
//! - **Generic frames**: `<sender> [<type digit> [<content>]]`, space separated,
//!   with the type defaulting to `4` (MESSAGE) and the content to empty.
//!
//! Banners, status replies and receive diagnostics from the HQ firmware are
//! recognised first and discarded. Every rule is a pure function.

use lifi_core::{MeshMessage, MessageType, NodeId, NODE_ID_LEN};

/// Status reply prefixes from the HQ firmware
pub const STATUS_PREFIXES: &[&str] = &["READY|", "INFO|", "OK|", "ERR|"];

/// Leading markers of banner and debug output
pub const DIAGNOSTIC_MARKERS: &[&str] = &["╔", "╚", "║", "═", "─", "===", ">>>"];

/// Receive diagnostics that can appear anywhere in a line
pub const DIAGNOSTIC_FRAGMENTS: &[&str] = &["RX IR:", "COMPLETE PACKET RECEIVED"];

/// Length of a header frame token
pub const HEADER_FRAME_LEN: usize = 9;

/// Content recorded for a header-only SOS
pub const SOS_CONTENT: &str = "SOS";

/// Decode one trimmed line into a message, or `None` if it carries none
pub fn parse_line(line: &str) -> Option<MeshMessage> {
    if line.is_empty() || is_control_line(line) {
        return None;
    }
    parse_header_frame(line).or_else(|| parse_generic_frame(line))
}

/// Whether the line is firmware status or diagnostic output
pub fn is_control_line(line: &str) -> bool {
    STATUS_PREFIXES.iter().any(|p| line.starts_with(p))
        || DIAGNOSTIC_MARKERS.iter().any(|m| line.starts_with(m))
        || DIAGNOSTIC_FRAGMENTS.iter().any(|f| line.contains(f))
}

/// Header-only emergency frame, e.g. `102a000h3`
pub fn parse_header_frame(line: &str) -> Option<MeshMessage> {
    if line.chars().any(char::is_whitespace) {
        return None;
    }

    let chars: Vec<char> = line.chars().collect();
    let is_sos = chars.last() == Some(&MessageType::Sos.digit());
    if chars.len() != HEADER_FRAME_LEN || !is_sos {
        return None;
    }

    let sender: String = chars[..NODE_ID_LEN].iter().collect();
    Some(MeshMessage::new(sender, MessageType::Sos, SOS_CONTENT))
}

/// Generic frame, e.g. `102a 3 HELP!`
pub fn parse_generic_frame(line: &str) -> Option<MeshMessage> {
    let mut fields = line.splitn(3, ' ');
    let sender = fields.next()?;
    let type_field = fields.next().unwrap_or("4");
    let content = fields.next().unwrap_or("");

    let sender = NodeId::parse(sender).ok()?;

    let mut digits = type_field.chars();
    let message_type = match (digits.next(), digits.next()) {
        (Some(digit), None) => MessageType::from_digit(digit)?,
        _ => return None,
    };

    Some(MeshMessage::new(sender, message_type, content))
}
