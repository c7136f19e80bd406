//! The response backend interface shared by every generation strategy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// One completed exchange in a session's retrieval memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user: String,
    pub assistant: String,
}

/// Per-session inputs a backend may read or extend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationContext {
    /// Prior exchanges, oldest first. Unbounded within a session.
    pub memory: Vec<Turn>,
    /// Rule-based context derived from the knowledge base for this turn.
    pub hint: Option<String>,
}

impl GenerationContext {
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint;
        self
    }
}

/// Produces a reply for one user utterance.
#[async_trait]
pub trait ResponseBackend: Send + Sync {
    /// Short stable name used in logs.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        user_text: &str,
        ctx: &mut GenerationContext,
    ) -> Result<String, BackendError>;
}
