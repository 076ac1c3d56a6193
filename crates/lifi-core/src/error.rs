//! Error types for the LiFi mesh data model

use thiserror::Error;

/// Errors raised while interpreting mesh data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifiError {
    /// Message type code outside 0..=4
    #[error("Invalid message type: {0}")]
    InvalidMessageType(String),

    /// Node status not one of unknown/active/sos
    #[error("Invalid node status: {0}")]
    InvalidNodeStatus(String),

    /// Node identifier is not a 4-character code
    #[error("Invalid node ID format: {0}")]
    InvalidNodeId(String),
}

impl LifiError {
    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            LifiError::InvalidMessageType(_) => "INVALID_MESSAGE_TYPE",
            LifiError::InvalidNodeStatus(_) => "INVALID_NODE_STATUS",
            LifiError::InvalidNodeId(_) => "INVALID_NODE_ID",
        }
    }
}

/// Result type alias for data model operations
pub type Result<T> = std::result::Result<T, LifiError>;
