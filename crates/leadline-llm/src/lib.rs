//! Leadline LLM crate - response backends and the plumbing around them.
//!
//! Contains the shared sliding-window rate limiter, the retry policy, the
//! Ollama chat client, and the two response backends (retrieval-augmented
//! and direct completion) composed through an ordered fallback chain.

pub mod backend;
pub mod direct;
pub mod error;
pub mod fallback;
pub mod ollama;
pub mod prompt;
pub mod rate_limit;
pub mod retrieval;
pub mod retry;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{GenerationContext, ResponseBackend, Turn};
pub use direct::DirectCompletionBackend;
pub use error::{BackendError, BackendErrorKind};
pub use fallback::{FallbackChain, Generated};
pub use ollama::{CompletionRequest, LanguageModel, OllamaClient};
pub use prompt::{Persona, PromptMessage, Role};
pub use rate_limit::RateLimiter;
pub use retrieval::RetrievalAugmentedBackend;
pub use retry::RetryPolicy;
