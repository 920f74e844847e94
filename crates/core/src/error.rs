//! Error types for the reach feature system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the reach feature system.
#[derive(Error, Debug)]
pub enum Error {
    /// A required request field is absent.
    #[error("Missing field: {field}")]
    MissingField { field: &'static str },

    /// An identifier list contains a token that is not an integer.
    #[error("Malformed identifier list in '{field}': invalid token '{token}'")]
    MalformedIdentifierList { field: &'static str, token: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data in an input table).
    #[error("Data error: {0}")]
    Data(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Error::MissingField { field }
    }

    /// Create a malformed identifier list error.
    pub fn malformed_ids(field: &'static str, token: impl Into<String>) -> Self {
        Error::MalformedIdentifierList {
            field,
            token: token.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }
}
