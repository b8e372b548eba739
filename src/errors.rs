use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the aura-face application
#[derive(Error, Debug)]
pub enum FaceError {
    /// Error in the static configuration (missing token, bad theme color, ...)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Error reading or writing a config file
    #[error("Failed to load config from {path}: {message}")]
    ConfigLoadError { path: PathBuf, message: String },

    /// Error from the key-value store collaborator
    #[error("Store error for key '{key}': {message}")]
    StoreError { key: String, message: String },

    /// Error establishing or using the gateway transport
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Error from the forecast lookup
    #[error("Weather lookup failed: {0}")]
    WeatherLookupError(String),

    /// Error when serializing data
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Error when deserializing data
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// Error driving the terminal presenter
    #[error("Terminal error: {0}")]
    TerminalError(String),
}

/// Result type alias for aura-face operations
pub type Result<T> = std::result::Result<T, FaceError>;

impl From<serde_json::Error> for FaceError {
    fn from(err: serde_json::Error) -> Self {
        FaceError::DeserializationError(err.to_string())
    }
}

impl From<std::io::Error> for FaceError {
    fn from(err: std::io::Error) -> Self {
        FaceError::TerminalError(err.to_string())
    }
}
