//! Direct completion backend, used when retrieval is unavailable.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::backend::{GenerationContext, ResponseBackend};
use crate::error::BackendError;
use crate::ollama::{CompletionRequest, LanguageModel};
use crate::prompt::{context_message, Persona, PromptMessage};
use crate::rate_limit::RateLimiter;

/// Stateless single-call completion: persona instruction, optional context,
/// then the user message.
pub struct DirectCompletionBackend {
    model: Arc<dyn LanguageModel>,
    limiter: Arc<RateLimiter>,
    persona: Persona,
    stream: bool,
}

impl DirectCompletionBackend {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        limiter: Arc<RateLimiter>,
        persona: Persona,
        stream: bool,
    ) -> Self {
        Self {
            model,
            limiter,
            persona,
            stream,
        }
    }

    fn build_request(&self, user_text: &str, hint: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            messages: vec![
                PromptMessage::system(self.persona.system_instruction()),
                context_message(hint),
                PromptMessage::user(user_text),
            ],
            stream: self.stream,
        }
    }
}

#[async_trait]
impl ResponseBackend for DirectCompletionBackend {
    fn name(&self) -> &str {
        "direct"
    }

    async fn generate(
        &self,
        user_text: &str,
        ctx: &mut GenerationContext,
    ) -> Result<String, BackendError> {
        if !self.limiter.try_acquire() {
            warn!(backend = self.name(), "Rate limit reached, skipping model call");
            return Err(BackendError::RateLimited);
        }

        let request = self.build_request(user_text, ctx.hint.as_deref());
        debug!(model = self.model.model_name(), stream = self.stream, "Direct completion");
        let text = self.model.complete(&request).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(BackendError::Malformed("empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}
