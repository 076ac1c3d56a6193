//! Error types for the state management layer

use lifi_core::LifiError;
use thiserror::Error;

/// Errors that can occur in state operations
#[derive(Error, Debug)]
pub enum StateError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Stored data could not be mapped back to the model
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
}

impl StateError {
    /// Get an error code for logging/metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            StateError::Database(_) => "DATABASE_ERROR",
            StateError::NotFound { .. } => "NOT_FOUND",
            StateError::InvalidData(_) => "INVALID_DATA",
            StateError::Connection(_) => "CONNECTION_ERROR",
        }
    }
}

impl From<sqlx::Error> for StateError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StateError::NotFound {
                entity: "record".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StateError::Connection(err.to_string())
            }
            sqlx::Error::Database(db_err) => StateError::Database(db_err.to_string()),
            _ => StateError::Database(err.to_string()),
        }
    }
}

impl From<LifiError> for StateError {
    fn from(err: LifiError) -> Self {
        StateError::InvalidData(err.to_string())
    }
}

/// Result type for state operations
pub type Result<T> = std::result::Result<T, StateError>;
