//! Domain error types
//!
//! All errors are domain-specific and don't expose third-party types.
//! Protocol clients map their internal failures into [`TransportError`]
//! before anything crosses back into the fan-out core.

use thiserror::Error;

/// Main Regsim error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum RegsimError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Registration intake errors (fatal before any target is contacted)
    #[error("Registration error: {0}")]
    Registration(String),

    /// Identifier generation errors
    #[error("Identifier generation error: {0}")]
    IdGeneration(String),

    /// Transport-level errors from protocol clients
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Template processing errors (document build inputs)
    #[error("Template error: {0}")]
    Template(String),

    /// Audit sink errors
    #[error("Audit error: {0}")]
    Audit(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Transport-specific errors
///
/// Errors raised by the protocol client collaborators (HL7 transport,
/// imaging transfer, document submission). These never unwind past the
/// target dispatcher; each becomes a failed outcome record.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to reach an endpoint
    #[error("Failed to connect to {endpoint}: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    /// Send operation failed mid-flight
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Send exceeded the target's configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Response arrived but could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An individual payload item was malformed or unsendable
    #[error("Rejected item: {0}")]
    RejectedItem(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for RegsimError {
    fn from(err: std::io::Error) -> Self {
        RegsimError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for RegsimError {
    fn from(err: serde_json::Error) -> Self {
        RegsimError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for RegsimError {
    fn from(err: toml::de::Error) -> Self {
        RegsimError::Configuration(format!("TOML parse error: {err}"))
    }
}
