//! Error types for DBN

use thiserror::Error;

/// Core error type for database interface operations
#[derive(Error, Debug)]
pub enum DbnError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL error: {0}")]
    Sql(String),

    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("Disposed: {0}")]
    Disposed(String),

    #[error("No response: {0}")]
    NoResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

impl DbnError {
    /// Errors raised by the database or the link to it.
    ///
    /// Callers usually retry these later instead of reporting them.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            DbnError::Connection(_) | DbnError::Sql(_) | DbnError::Timeout(_)
        )
    }

    /// Check if this error is a cooperative cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, DbnError::Cancelled)
    }

    /// Build an internal error from a caught panic payload
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "task panicked".to_string()
        };
        DbnError::Internal(message)
    }
}

/// Result type alias for DBN operations
pub type Result<T> = std::result::Result<T, DbnError>;
