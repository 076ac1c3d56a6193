//! Error types for link operations
//!
//! Connect-time failures are reported once and never retried by the link.
//! Read errors inside the reader are logged and survived, and store errors
//! during recording are logged by the bridge, so neither shows up here.

use thiserror::Error;

/// Main error type for link operations
#[derive(Error, Debug)]
pub enum LinkError {
    // ===== Connection Errors =====
    /// No port was given and discovery found nothing
    #[error("No LiFi device found (available ports: [{}])", .available.join(", "))]
    NoDeviceFound {
        /// Every port seen during enumeration
        available: Vec<String>,
    },

    /// Serial port open failed
    #[error("Failed to open serial port {port}: {reason}")]
    LinkOpenFailed {
        /// Port path
        port: String,
        /// Failure reason
        reason: String,
    },

    /// Operation needs a connected link
    #[error("Not connected to a LiFi device")]
    NotConnected,

    /// Serial write error
    #[error("Serial write error: {0}")]
    WriteError(String),

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LinkError {
    /// Check if this error is recoverable/retriable
    pub fn is_retriable(&self) -> bool {
        matches!(self, LinkError::NotConnected | LinkError::WriteError(_))
    }

    /// Get an error code for logging/metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            LinkError::NoDeviceFound { .. } => "NO_DEVICE_FOUND",
            LinkError::LinkOpenFailed { .. } => "LINK_OPEN_FAILED",
            LinkError::NotConnected => "NOT_CONNECTED",
            LinkError::WriteError(_) => "WRITE_ERROR",
            LinkError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    pub(crate) fn open_failed(port: &str, err: tokio_serial::Error) -> Self {
        LinkError::LinkOpenFailed {
            port: port.to_string(),
            reason: err.description,
        }
    }
}

/// Result type alias for link operations
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LinkError::NotConnected.error_code(), "NOT_CONNECTED");
        let err = LinkError::LinkOpenFailed {
            port: "/dev/ttyUSB0".into(),
            reason: "busy".into(),
        };
        assert_eq!(err.error_code(), "LINK_OPEN_FAILED");
        assert!(err.to_string().contains("/dev/ttyUSB0"));
    }

    #[test]
    fn test_no_device_lists_ports() {
        let err = LinkError::NoDeviceFound {
            available: vec!["/dev/ttyS0".into(), "/dev/ttyS1".into()],
        };
        assert_eq!(
            err.to_string(),
            "No LiFi device found (available ports: [/dev/ttyS0, /dev/ttyS1])"
        );
    }

    #[test]
    fn test_is_retriable() {
        assert!(LinkError::WriteError("broken pipe".into()).is_retriable());
        assert!(!LinkError::NoDeviceFound { available: vec![] }.is_retriable());
        assert!(!LinkError::InvalidConfig("x".into()).is_retriable());
    }

    #[test]
    fn test_open_failed_from_serial_error() {
        let err = LinkError::open_failed(
            "/dev/ttyUSB9",
            tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "no such device"),
        );
        assert_eq!(
            err.to_string(),
            "Failed to open serial port /dev/ttyUSB9: no such device"
        );
    }
}
