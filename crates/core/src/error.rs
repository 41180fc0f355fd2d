//! Error types for the outbound call agent

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the call agent
#[derive(Error, Debug)]
pub enum Error {
    // Pipeline errors (buffering, gating, transcription)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    // Telephony errors (dial, hangup, audio publish)
    #[error("Telephony error: {0}")]
    Telephony(String),

    // Classification errors
    #[error("Classifier error: {0}")]
    Classifier(String),

    // Persistence errors (lead store)
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Dispatch payload errors
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}
