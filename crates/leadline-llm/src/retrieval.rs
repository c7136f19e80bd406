//! Retrieval-augmented backend: knowledge search plus session memory.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use leadline_vector::KnowledgeSearch;

use crate::backend::{GenerationContext, ResponseBackend, Turn};
use crate::error::BackendError;
use crate::ollama::{CompletionRequest, LanguageModel};
use crate::prompt::{Persona, PromptMessage};
use crate::rate_limit::RateLimiter;

/// Retrieval-augmented generation over the knowledge index.
///
/// Retrieves the top-k fragments for the utterance, merges them with the
/// turn's rule-based hint, fills the sales template together with the
/// session memory and asks the model. A successful turn is appended to the
/// memory; a failed one leaves it untouched.
pub struct RetrievalAugmentedBackend {
    model: Arc<dyn LanguageModel>,
    search: Arc<KnowledgeSearch>,
    limiter: Arc<RateLimiter>,
    persona: Persona,
    top_k: usize,
}

impl RetrievalAugmentedBackend {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        search: Arc<KnowledgeSearch>,
        limiter: Arc<RateLimiter>,
        persona: Persona,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            search,
            limiter,
            persona,
            top_k,
        }
    }
}

#[async_trait]
impl ResponseBackend for RetrievalAugmentedBackend {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn generate(
        &self,
        user_text: &str,
        ctx: &mut GenerationContext,
    ) -> Result<String, BackendError> {
        let fragments = self.search.search(user_text, self.top_k).await?;
        let mut context = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if let Some(hint) = ctx.hint.as_deref() {
            if !context.is_empty() {
                context.push('\n');
            }
            context.push_str(hint);
        }
        debug!(
            model = self.model.model_name(),
            fragments = fragments.len(),
            memory = ctx.memory.len(),
            "Assembled retrieval context"
        );

        let prompt = self.persona.retrieval_prompt(&ctx.memory, &context, user_text);
        let request = CompletionRequest {
            messages: vec![PromptMessage::user(prompt)],
            stream: false,
        };
        if !self.limiter.try_acquire() {
            warn!(backend = self.name(), "Rate limit reached, skipping model call");
            return Err(BackendError::RateLimited);
        }
        let text = self.model.complete(&request).await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(BackendError::Malformed("empty completion".to_string()));
        }

        ctx.memory.push(Turn {
            user: user_text.to_string(),
            assistant: text.clone(),
        });
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use leadline_core::KnowledgeBase;
    use leadline_vector::HashEmbedding;
    use std::time::Duration;

    async fn backend(model: Arc<ScriptedModel>, limiter: Arc<RateLimiter>) -> RetrievalAugmentedBackend {
        let kb = KnowledgeBase::builtin().unwrap();
        let search = KnowledgeSearch::build(&kb, HashEmbedding::default()).await.unwrap();
        RetrievalAugmentedBackend::new(
            model,
            Arc::new(search),
            limiter,
            Persona::new("Ava", &kb.company.name),
            2,
        )
    }

    #[tokio::test]
    async fn test_generate_appends_turn_and_sends_context() {
        let model = Arc::new(ScriptedModel::replying(&["StockPilot tracks stock in real time."]));
        let rag = backend(model.clone(), Arc::new(RateLimiter::default())).await;
        let mut ctx = GenerationContext::default().with_hint(Some("Pricing depends on scope.".into()));

        let text = rag.generate("inventory management system", &mut ctx).await.unwrap();
        assert_eq!(text, "StockPilot tracks stock in real time.");
        assert_eq!(ctx.memory.len(), 1);
        assert_eq!(ctx.memory[0].user, "inventory management system");

        let sent = model.requests();
        assert_eq!(sent.len(), 1);
        let prompt = &sent[0].messages[0].content;
        assert!(prompt.contains("Pricing depends on scope."));
        assert!(prompt.contains("Human: inventory management system"));
        assert!(!sent[0].stream);
    }

    #[tokio::test]
    async fn test_memory_is_replayed_on_next_turn() {
        let model = Arc::new(ScriptedModel::replying(&["first", "second"]));
        let rag = backend(model.clone(), Arc::new(RateLimiter::default())).await;
        let mut ctx = GenerationContext::default();
        rag.generate("hello erp", &mut ctx).await.unwrap();
        rag.generate("and pricing", &mut ctx).await.unwrap();
        let prompt = &model.requests()[1].messages[0].content;
        assert!(prompt.contains("Human: hello erp\nAssistant: first\n"));
        assert_eq!(ctx.memory.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_leaves_memory_untouched() {
        let model = Arc::new(ScriptedModel::failing());
        let rag = backend(model, Arc::new(RateLimiter::default())).await;
        let mut ctx = GenerationContext::default();
        assert!(rag.generate("erp", &mut ctx).await.is_err());
        assert!(ctx.memory.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_skips_model() {
        let model = Arc::new(ScriptedModel::replying(&["unused"]));
        let limiter = Arc::new(RateLimiter::new(0, Duration::from_secs(60)));
        let rag = backend(model.clone(), limiter).await;
        let err = rag
            .generate("erp", &mut GenerationContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::RateLimited));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_keeps_rate_slot() {
        let model = Arc::new(ScriptedModel::replying(&["unused"]));
        let limiter = Arc::new(RateLimiter::new(1, Duration::from_secs(60)));
        let rag = backend(model.clone(), limiter.clone()).await;
        let err = rag
            .generate("???", &mut GenerationContext::default())
            .await
            .unwrap_err();
        assert!(!matches!(err, BackendError::RateLimited));
        assert!(model.requests().is_empty());
        assert!(limiter.allow());
    }

    #[tokio::test]
    async fn test_blank_completion_is_malformed() {
        let model = Arc::new(ScriptedModel::replying(&["   "]));
        let rag = backend(model, Arc::new(RateLimiter::default())).await;
        let err = rag
            .generate("erp", &mut GenerationContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }
}
