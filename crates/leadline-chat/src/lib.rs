//! Dialogue layer for the Leadline sales assistant.
//!
//! Routes visitor messages through the greeting, lead capture, relevance
//! gate and keyword intent table, and falls back to the response backends
//! for everything else.

pub mod error;
pub mod gate;
pub mod intent;
pub mod lead;
pub mod notify;
pub mod orchestrator;
pub mod replies;
pub mod session;
pub mod summary;

pub use error::ChatError;
pub use gate::ContextRelevanceGate;
pub use intent::{Intent, IntentKind};
pub use lead::{LeadCollector, LeadStage, LeadStep};
pub use notify::{LeadNotifier, TracingNotifier, WebhookNotifier};
pub use orchestrator::{DialogueOrchestrator, Reply, ReplySource};
pub use replies::CannedReplies;
pub use session::{ContextMemory, ConversationState, Session, SessionStore};
pub use summary::ConversationSummarizer;
