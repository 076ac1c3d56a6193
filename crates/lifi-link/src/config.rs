//! Configuration for the HQ serial link
//!
//! Every timing the link and its reader use lives here, with defaults tuned
//! for the HQ firmware (115200 baud, a two second reset after the port opens).
//! Durations serialize as humantime strings such as `"2s"` or `"10ms"`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::discovery::DEFAULT_DEVICE_IDENTIFIERS;
use crate::error::{LinkError, Result};

/// Default baud rate of the HQ device
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default serial read timeout
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Time the device needs to reboot after the port is opened
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// How long `disconnect` waits for the reader before forcing the close
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 2000;

/// Sleep between idle polls of the channel
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Backoff after a transient read error
pub const DEFAULT_ERROR_BACKOFF_MS: u64 = 1000;

/// Longest line the reader buffers before giving up on a newline
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024;

/// Link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Fixed serial port; discovery runs when absent
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate (default: 115200)
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Serial read timeout
    #[serde(with = "humantime_serde", default = "default_read_timeout")]
    pub read_timeout: Duration,

    /// Wait after opening the port before reading
    #[serde(with = "humantime_serde", default = "default_settle_delay")]
    pub settle_delay: Duration,

    /// Bound on the reader join during disconnect
    #[serde(with = "humantime_serde", default = "default_join_timeout")]
    pub join_timeout: Duration,

    /// Idle poll interval of the reader
    #[serde(with = "humantime_serde", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Pause after a transient read error
    #[serde(with = "humantime_serde", default = "default_error_backoff")]
    pub error_backoff: Duration,

    /// Oversized partial lines are discarded past this many bytes
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Substrings matched (case-insensitively) against port descriptions
    #[serde(default = "default_device_identifiers")]
    pub device_identifiers: Vec<String>,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout() -> Duration {
    Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(DEFAULT_SETTLE_DELAY_MS)
}

fn default_join_timeout() -> Duration {
    Duration::from_millis(DEFAULT_JOIN_TIMEOUT_MS)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
}

fn default_error_backoff() -> Duration {
    Duration::from_millis(DEFAULT_ERROR_BACKOFF_MS)
}

fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}

fn default_device_identifiers() -> Vec<String> {
    DEFAULT_DEVICE_IDENTIFIERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            read_timeout: default_read_timeout(),
            settle_delay: default_settle_delay(),
            join_timeout: default_join_timeout(),
            poll_interval: default_poll_interval(),
            error_backoff: default_error_backoff(),
            max_line_length: default_max_line_length(),
            device_identifiers: default_device_identifiers(),
        }
    }
}

impl LinkConfig {
    /// Start a builder with default values
    pub fn builder() -> LinkConfigBuilder {
        LinkConfigBuilder::new()
    }

    /// Reject values the link cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            return Err(LinkError::InvalidConfig("baud_rate must be positive".into()));
        }
        if self.poll_interval.is_zero() {
            return Err(LinkError::InvalidConfig(
                "poll_interval must be non-zero".into(),
            ));
        }
        if self.max_line_length == 0 {
            return Err(LinkError::InvalidConfig(
                "max_line_length must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`LinkConfig`]
#[derive(Debug, Default)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed port instead of discovery
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = Some(port.into());
        self
    }

    /// Set baud rate
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    /// Set serial read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the post-open settle delay
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Set the reader join timeout
    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.config.join_timeout = timeout;
        self
    }

    /// Set the idle poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the read error backoff
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.config.error_backoff = backoff;
        self
    }

    /// Set the partial line limit
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    /// Replace the discovery vocabulary
    pub fn device_identifiers<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.device_identifiers = identifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Build the configuration
    pub fn build(self) -> LinkConfig {
        self.config
    }
}

// Custom serde module for Duration with humantime
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
