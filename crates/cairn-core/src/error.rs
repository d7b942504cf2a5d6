//! Error types for cairn.

use thiserror::Error;

/// Result type alias using cairn's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cairn operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record not found or not owned by the caller
    #[error("Record not found: {0}")]
    RecordNotFound(uuid::Uuid),

    /// Embedding generation or dimensionality failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Text generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Vector index operation failed
    #[error("Index error: {0}")]
    Index(String),

    /// File storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
