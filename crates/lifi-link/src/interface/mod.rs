//! Byte stream handling for the HQ device link
//!
//! - [`serial::LinkConnection`] - Connection lifecycle, background reader and sends
//! - [`LineBuffer`] - Newline framing over the raw byte stream
//!
//! The link runs over a serial port in production. Any async byte stream can
//! be attached instead, which is how the tests drive it.

mod serial;

pub use serial::LinkConnection;

use bytes::{Buf, BytesMut};
use tracing::{trace, warn};

/// Buffer size for reading from the channel
pub(crate) const READ_BUFFER_SIZE: usize = 512;

/// Connection state of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Connection in progress
    Connecting,
    /// Reader running, sends accepted
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Accumulates raw bytes and yields complete, trimmed, non-empty lines
///
/// Lines longer than `max_len` bytes are dropped whole. Once a partial line
/// outgrows the limit, everything up to and including its newline is
/// skipped, so the tail of a dropped frame never surfaces as a line.
#[derive(Debug)]
pub struct LineBuffer {
    buffer: BytesMut,
    max_len: usize,
    discarding: bool,
}

impl LineBuffer {
    /// Create a buffer that gives up on lines longer than `max_len` bytes
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE * 2),
            max_len,
            discarding: false,
        }
    }

    /// Append bytes read from the channel
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Bytes waiting for a newline
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the rest of an oversized line is being skipped
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Next complete line, decoded and trimmed
    ///
    /// Blank lines are skipped, as are oversized ones. A device that never
    /// sends a newline cannot grow the buffer without bound.
    pub fn next_line(&mut self) -> Option<String> {
        if self.discarding {
            match self.buffer.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    self.buffer.advance(pos + 1);
                    self.discarding = false;
                    trace!("Skipped rest of oversized line");
                }
                None => {
                    self.buffer.clear();
                    return None;
                }
            }
        }

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw = self.buffer.split_to(pos + 1);
            if pos > self.max_len {
                warn!(discarded = pos, "Discarding oversized line");
                continue;
            }
            let line = decode_line(&raw[..pos]);
            let line = line.trim();
            if !line.is_empty() {
                return Some(line.to_string());
            }
        }

        if self.buffer.len() > self.max_len {
            warn!(discarded = self.buffer.len(), "Discarding oversized partial line");
            self.buffer.clear();
            self.discarding = true;
        } else if !self.buffer.is_empty() {
            trace!(have = self.buffer.len(), "Waiting for end of line");
        }
        None
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences
pub fn decode_line(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of the line
                    None => return text,
                }
            }
        }
    }
}
