//! Ordered backend fallback.
//!
//! Backends are tried in order; any error moves on to the next one. Each
//! backend is attempted at most once per turn.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::backend::{GenerationContext, ResponseBackend};
use crate::error::BackendError;

/// Text produced by the chain and the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub backend: String,
}

pub struct FallbackChain {
    backends: Vec<Arc<dyn ResponseBackend>>,
}

impl FallbackChain {
    /// Returns `None` when `backends` is empty.
    pub fn new(backends: Vec<Arc<dyn ResponseBackend>>) -> Option<Self> {
        if backends.is_empty() {
            None
        } else {
            Some(Self { backends })
        }
    }

    /// Primary first, then the fallback.
    pub fn pair(primary: Arc<dyn ResponseBackend>, fallback: Arc<dyn ResponseBackend>) -> Self {
        Self {
            backends: vec![primary, fallback],
        }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try each backend in order. On total failure the last error is returned.
    pub async fn run(
        &self,
        user_text: &str,
        ctx: &mut GenerationContext,
    ) -> Result<Generated, BackendError> {
        let mut last_error = BackendError::Connection("no backend attempted".to_string());

        for (i, backend) in self.backends.iter().enumerate() {
            match backend.generate(user_text, ctx).await {
                Ok(text) => {
                    if i > 0 {
                        info!(backend = %backend.name(), "Fallback backend produced the reply");
                    }
                    return Ok(Generated {
                        text,
                        backend: backend.name().to_string(),
                    });
                }
                Err(err) => {
                    match self.backends.get(i + 1) {
                        Some(next) => warn!(
                            backend = %backend.name(),
                            kind = %err.kind(),
                            error = %err,
                            next_backend = %next.name(),
                            "Backend failed, trying next backend"
                        ),
                        None => warn!(
                            backend = %backend.name(),
                            kind = %err.kind(),
                            error = %err,
                            "Backend failed, no backends left"
                        ),
                    }
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl ResponseBackend for FallbackChain {
    fn name(&self) -> &str {
        self.backends.first().map(|b| b.name()).unwrap_or("fallback")
    }

    async fn generate(
        &self,
        user_text: &str,
        ctx: &mut GenerationContext,
    ) -> Result<String, BackendError> {
        self.run(user_text, ctx).await.map(|g| g.text)
    }
}
