//! Error types for the dialogue layer.
//!
//! None of these reach the visitor as errors: the orchestrator turns each
//! into a reply (see `DialogueOrchestrator::handle`).

use leadline_llm::BackendError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },
    #[error("no response backend available: {0}")]
    BackendUnavailable(String),
    #[error("rate limit exceeded")]
    RateLimitExceeded,
}

impl From<BackendError> for ChatError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::RateLimited => ChatError::RateLimitExceeded,
            other => ChatError::BackendUnavailable(other.to_string()),
        }
    }
}
