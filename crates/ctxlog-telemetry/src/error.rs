//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur with telemetry operations.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A message started with `{` but was not valid JSON.
    ///
    /// This points at the producer of the log line, so it is never
    /// downgraded to a plain-text message.
    #[error("malformed JSON message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// The canonical log object could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Writing a formatted line to a sink failed.
    #[error("sink error: {0}")]
    SinkError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Initialization error.
    #[error("Initialization error: {0}")]
    InitError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
