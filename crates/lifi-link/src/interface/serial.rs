//! Serial link to the HQ device
//!
//! [`LinkConnection`] owns the channel lifecycle. While connected, one
//! background task reads newline-delimited frames and passes each line to
//! the [`HqBridge`]; sends go through the write half directly.
//!
//! Lifecycle: `Disconnected -> Connecting -> Connected -> Disconnected`. A
//! failed connect returns to `Disconnected` with nothing left running.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, trace, warn};

use crate::bridge::HqBridge;
use crate::config::LinkConfig;
use crate::discovery::{find_device, list_ports};
use crate::encoder::{self, Intent};
use crate::error::{LinkError, Result};
use crate::interface::{ConnectionState, LineBuffer, READ_BUFFER_SIZE};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Running reader task and its stop signal
struct ReaderHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Connection to the HQ device
///
/// One instance drives one device. Callers serialize `connect` and
/// `disconnect` by holding it behind a lock; the reader runs independently.
pub struct LinkConnection {
    /// Link settings
    config: LinkConfig,

    /// Recording path for decoded lines
    bridge: Arc<HqBridge>,

    /// Current connection state
    state: ConnectionState,

    /// Port in use while connected
    port: Option<String>,

    /// Write half of the channel
    writer: Option<Arc<Mutex<BoxedWriter>>>,

    /// Background reader
    reader: Option<ReaderHandle>,
}

impl LinkConnection {
    /// Create a disconnected link
    pub fn new(config: LinkConfig, bridge: Arc<HqBridge>) -> Self {
        Self {
            config,
            bridge,
            state: ConnectionState::Disconnected,
            port: None,
            writer: None,
            reader: None,
        }
    }

    /// Get the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if currently connected
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Port of the active link
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Link settings
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Recording path the reader feeds
    pub fn bridge(&self) -> &Arc<HqBridge> {
        &self.bridge
    }

    /// Open the device and start reading
    ///
    /// Without a port, the configured port is used, then discovery. Already
    /// being connected is not an error.
    pub async fn connect(&mut self, port: Option<&str>) -> Result<()> {
        if self.state == ConnectionState::Connected {
            debug!(port = ?self.port, "Already connected");
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let result = self.open_and_attach(port).await;
        if result.is_err() {
            self.state = ConnectionState::Disconnected;
        }
        result
    }

    async fn open_and_attach(&mut self, port: Option<&str>) -> Result<()> {
        let port = match port.map(str::to_string).or_else(|| self.config.port.clone()) {
            Some(port) => port,
            None => find_device(&self.config.device_identifiers).ok_or_else(|| {
                LinkError::NoDeviceFound {
                    available: list_ports().into_iter().map(|p| p.name).collect(),
                }
            })?,
        };

        info!(port = %port, baud = self.config.baud_rate, "Connecting to serial port");
        let stream = open_serial(&port, &self.config)?;

        // The HQ board resets when the port opens
        if !self.config.settle_delay.is_zero() {
            debug!(delay = ?self.config.settle_delay, "Waiting for device to settle");
            tokio::time::sleep(self.config.settle_delay).await;
        }

        self.attach(stream, port).await;
        Ok(())
    }

    /// Start the link over an already open byte stream
    ///
    /// An existing link is torn down first.
    pub async fn attach<S>(&mut self, stream: S, port: impl Into<String>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        if self.reader.is_some() {
            self.disconnect().await;
        }

        let port = port.into();
        let (read_half, write_half) = tokio::io::split(stream);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run_reader(
            read_half,
            self.bridge.clone(),
            self.config.clone(),
            stop_rx,
            port.clone(),
        ));

        let writer: BoxedWriter = Box::new(write_half);
        self.writer = Some(Arc::new(Mutex::new(writer)));
        self.reader = Some(ReaderHandle { stop_tx, task });
        self.port = Some(port.clone());
        self.state = ConnectionState::Connected;

        info!(port = %port, "Connected to LiFi device");
        self.bridge.sink().on_connection_status(true);
    }

    /// Stop the reader and close the channel
    ///
    /// Does nothing when not connected. The reader gets `join_timeout` to
    /// finish before it is aborted.
    pub async fn disconnect(&mut self) {
        let Some(ReaderHandle { stop_tx, mut task }) = self.reader.take() else {
            self.state = ConnectionState::Disconnected;
            return;
        };

        let _ = stop_tx.send(true);
        match tokio::time::timeout(self.config.join_timeout, &mut task).await {
            Ok(Ok(())) => debug!("Reader stopped"),
            Ok(Err(e)) => warn!(error = %e, "Reader task ended abnormally"),
            Err(_) => {
                warn!(
                    timeout = ?self.config.join_timeout,
                    "Reader did not stop in time, forcing close"
                );
                task.abort();
            }
        }

        self.writer = None;
        self.state = ConnectionState::Disconnected;
        let port = self.port.take();

        info!(port = ?port, "Disconnected from LiFi device");
        self.bridge.sink().on_connection_status(false);
    }

    /// Write a raw command line
    ///
    /// No retry and no queueing. A failed write leaves the link connected.
    pub async fn send(&self, command: &str) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(LinkError::NotConnected);
        }
        let writer = self.writer.as_ref().ok_or(LinkError::NotConnected)?;

        debug!(command = command.trim_end(), "Sending command");
        let mut writer = writer.lock().await;
        writer.write_all(command.as_bytes()).await.map_err(|e| {
            error!(error = %e, "Serial write error");
            LinkError::WriteError(e.to_string())
        })?;
        writer
            .flush()
            .await
            .map_err(|e| LinkError::WriteError(format!("Flush failed: {}", e)))
    }

    /// Encode and send an intent
    pub async fn send_intent(&self, intent: &Intent) -> Result<()> {
        self.send(&intent.encode()).await
    }

    /// Broadcast to every node
    pub async fn send_broadcast(&self, content: &str) -> Result<()> {
        self.send(&encoder::broadcast(content)).await
    }

    /// Send to one node through the mesh
    pub async fn send_targeted(&self, node_id: &str, content: &str) -> Result<()> {
        self.send(&encoder::targeted(node_id, content)).await
    }

    /// Direct message to one node
    pub async fn send_message(&self, node_id: &str, content: &str) -> Result<()> {
        self.send(&encoder::direct_message(node_id, content)).await
    }

    /// Set the HQ device id
    pub async fn send_init(&self, id: &str) -> Result<()> {
        self.send(&encoder::init(id)).await
    }
}

impl Drop for LinkConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            let _ = reader.stop_tx.send(true);
            reader.task.abort();
        }
    }
}

impl std::fmt::Debug for LinkConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkConnection")
            .field("port", &self.port)
            .field("state", &self.state)
            .field("baud_rate", &self.config.baud_rate)
            .finish()
    }
}

fn open_serial(port: &str, config: &LinkConfig) -> Result<SerialStream> {
    tokio_serial::new(port, config.baud_rate)
        .timeout(config.read_timeout)
        .open_native_async()
        .map_err(|e| {
            warn!(port, error = %e, "Failed to open serial port");
            LinkError::open_failed(port, e)
        })
}

/// Sleep unless stopped first; returns true on stop
async fn pause(stop_rx: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = stop_rx.changed() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

/// Reader loop: runs until the stop signal, surviving read errors
async fn run_reader<R>(
    mut reader: R,
    bridge: Arc<HqBridge>,
    config: LinkConfig,
    mut stop_rx: watch::Receiver<bool>,
    port: String,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    debug!(port = %port, "Reader started");
    let mut lines = LineBuffer::new(config.max_line_length);
    let mut chunk = [0u8; READ_BUFFER_SIZE];

    loop {
        while let Some(line) = lines.next_line() {
            bridge.handle_line(&line).await;
        }

        let result = tokio::select! {
            _ = stop_rx.changed() => break,
            result = reader.read(&mut chunk) => result,
        };

        let stopped = match result {
            Ok(0) => pause(&mut stop_rx, config.poll_interval).await,
            Ok(n) => {
                trace!(bytes = n, "Read from serial port");
                lines.extend(&chunk[..n]);
                false
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                pause(&mut stop_rx, config.poll_interval).await
            }
            Err(e) => {
                warn!(port = %port, error = %e, "Serial read error, retrying");
                pause(&mut stop_rx, config.error_backoff).await
            }
        };

        if stopped {
            break;
        }
    }

    debug!(port = %port, "Reader stopped");
}
