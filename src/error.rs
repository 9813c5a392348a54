//! Error types for scenegate

use thiserror::Error;

/// Result type alias using scenegate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scenegate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sandbox execution error (interpreter could not be run)
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Interpreter not found on this system
    #[error("Interpreter not found: {0}")]
    InterpreterNotFound(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Config(_))
    }
}
