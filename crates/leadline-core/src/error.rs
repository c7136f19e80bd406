use thiserror::Error;

/// Top-level error type for the Leadline system.
///
/// Subsystem crates define their own error types and implement
/// `From<LeadlineError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LeadlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Knowledge base error: {0}")]
    Knowledge(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LeadlineError {
    fn from(err: toml::de::Error) -> Self {
        LeadlineError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LeadlineError {
    fn from(err: toml::ser::Error) -> Self {
        LeadlineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LeadlineError {
    fn from(err: serde_json::Error) -> Self {
        LeadlineError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Leadline operations.
pub type Result<T> = std::result::Result<T, LeadlineError>;
