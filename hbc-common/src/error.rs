//! Common error types for the heartbeat classifier

use thiserror::Error;

/// Common result type for classifier operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by training and serving
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio container or codec could not be read
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Spectral analysis produced no usable features
    #[error("Feature extraction error: {0}")]
    Feature(String),

    /// Model fitting, prediction or (de)serialization error
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid caller input (e.g. wrong feature dimension)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Model(format!("Model serialization failed: {}", err))
    }
}
