//! Test utilities for driving the link without hardware
//!
//! [`simulated_device`] returns an in-memory duplex pipe: attach the host end
//! to a [`LinkConnection`](crate::LinkConnection) and use the
//! [`DeviceSimulator`] end to play the HQ firmware. [`RecordingSink`] keeps
//! every event for later assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use lifi_link::test_utils::{simulated_device, RecordingSink};
//!
//! let (mut device, host) = simulated_device();
//! link.attach(host, "sim0").await;
//! device.emit_line("102a 3 HELP!").await?;
//! assert!(sink.wait_for_events(3, Duration::from_secs(1)).await);
//! ```

use lifi_core::{EventSink, LinkEvent, MessageView, NodeId};
use parking_lot::Mutex;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

/// Capacity of each direction of the simulated pipe
const PIPE_CAPACITY: usize = 4096;

/// Step between checks while waiting for events
const WAIT_STEP: Duration = Duration::from_millis(5);

/// Sink that records every event it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<LinkEvent>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event so far, in order
    pub fn events(&self) -> Vec<LinkEvent> {
        self.events.lock().clone()
    }

    /// Recorded messages, in order
    pub fn messages(&self) -> Vec<MessageView> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                LinkEvent::NewMessage { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(node_id, node_name)` of every SOS alert
    pub fn sos_alerts(&self) -> Vec<(String, String)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                LinkEvent::SosAlert {
                    node_id, node_name, ..
                } => Some((node_id.to_string(), node_name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Connection status changes, in order
    pub fn statuses(&self) -> Vec<bool> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                LinkEvent::Status { connected } => Some(*connected),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Wait until at least `count` events arrived; false on timeout
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.events.lock().len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
    }

    fn push(&self, event: LinkEvent) {
        self.events.lock().push(event);
    }
}

impl EventSink for RecordingSink {
    fn on_message(&self, message: &MessageView) {
        self.push(LinkEvent::NewMessage {
            message: message.clone(),
        });
    }

    fn on_sos_alert(&self, node_id: &NodeId, node_name: &str, content: &str) {
        self.push(LinkEvent::SosAlert {
            node_id: node_id.clone(),
            node_name: node_name.to_string(),
            content: content.to_string(),
        });
    }

    fn on_connection_status(&self, connected: bool) {
        self.push(LinkEvent::Status { connected });
    }
}

/// Device end of a simulated serial link
#[derive(Debug)]
pub struct DeviceSimulator {
    stream: BufReader<DuplexStream>,
}

/// Create a simulated device and the host end to attach to a link
pub fn simulated_device() -> (DeviceSimulator, DuplexStream) {
    let (device, host) = tokio::io::duplex(PIPE_CAPACITY);
    (
        DeviceSimulator {
            stream: BufReader::new(device),
        },
        host,
    )
}

impl DeviceSimulator {
    /// Send one line, newline appended
    pub async fn emit_line(&mut self, line: &str) -> io::Result<()> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        self.emit_bytes(&frame).await
    }

    /// Send raw bytes as they are
    pub async fn emit_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    /// Read one command written by the host, including its newline
    pub async fn read_command(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "host closed the link",
            ));
        }
        Ok(line)
    }

    /// Like [`read_command`](Self::read_command) but gives up after `timeout`
    pub async fn read_command_timeout(&mut self, timeout: Duration) -> io::Result<String> {
        tokio::time::timeout(timeout, self.read_command())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no command from host"))?
    }
}
