use thiserror::Error;

/// Failure of a single response backend or language model call.
///
/// Every variant is recoverable: the fallback chain moves on to the next
/// backend and the dialogue layer turns a final failure into a user-facing
/// apology.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

/// Coarse failure class, used for logging and fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Timeout,
    Connection,
    Malformed,
    RateLimited,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Connection => "connection",
            BackendErrorKind::Malformed => "malformed",
            BackendErrorKind::RateLimited => "rate_limited",
        }
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BackendError {
    /// Non-success HTTP statuses count as connection failures.
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Timeout(_) => BackendErrorKind::Timeout,
            BackendError::Connection(_) | BackendError::Http { .. } => BackendErrorKind::Connection,
            BackendError::Malformed(_) => BackendErrorKind::Malformed,
            BackendError::RateLimited => BackendErrorKind::RateLimited,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Malformed(err.to_string())
    }
}

impl From<leadline_core::LeadlineError> for BackendError {
    fn from(err: leadline_core::LeadlineError) -> Self {
        BackendError::Malformed(err.to_string())
    }
}
