//! Error types for toolpulse-core

use thiserror::Error;

/// Main error type for the toolpulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for toolpulse-core
pub type Result<T> = std::result::Result<T, Error>;
