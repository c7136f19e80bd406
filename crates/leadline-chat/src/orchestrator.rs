//! Dialogue orchestrator: routes each visitor message to the greeting, lead
//! capture, relevance gate, intent table or response backends.
//!
//! Every path ends in a reply string. Errors are turned into canned texts
//! inside `handle` and never reach the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use leadline_core::config::ChatConfig;
use leadline_core::types::{ContactSubmission, Sender};
use leadline_core::{KnowledgeBase, PersistenceGateway};
use leadline_llm::{BackendError, FallbackChain, GenerationContext};

use crate::error::ChatError;
use crate::gate::ContextRelevanceGate;
use crate::intent::{self, Intent, IntentKind};
use crate::lead::{LeadCollector, LeadStep};
use crate::notify::{LeadNotifier, TracingNotifier};
use crate::replies::{shorten, CannedReplies, APOLOGY, TOO_BUSY};
use crate::session::{Session, SessionStore};

/// Where a reply came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplySource {
    Greeting,
    Knowledge(IntentKind),
    LeadFlow,
    OffTopic,
    /// Generated by the named backend.
    Backend(String),
    Clarify,
    TooLong,
    Busy,
    Apology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }

    /// Whether this reply should become the session's topic context.
    fn updates_context(&self) -> bool {
        matches!(
            self.source,
            ReplySource::Knowledge(_) | ReplySource::Backend(_)
        )
    }
}

pub struct DialogueOrchestrator {
    kb: Arc<KnowledgeBase>,
    backends: FallbackChain,
    gateway: Arc<dyn PersistenceGateway>,
    notifier: Arc<dyn LeadNotifier>,
    sessions: SessionStore,
    leads: LeadCollector,
    gate: ContextRelevanceGate,
    replies: CannedReplies,
    config: ChatConfig,
    failures: AtomicU64,
}

impl DialogueOrchestrator {
    pub fn new(
        kb: Arc<KnowledgeBase>,
        backends: FallbackChain,
        gateway: Arc<dyn PersistenceGateway>,
        config: ChatConfig,
        assistant_name: &str,
    ) -> Self {
        let replies = CannedReplies::new(assistant_name, kb.company.name.clone());
        Self {
            kb,
            backends,
            gateway,
            notifier: Arc::new(TracingNotifier),
            sessions: SessionStore::new(),
            leads: LeadCollector,
            gate: ContextRelevanceGate,
            replies,
            config,
            failures: AtomicU64::new(0),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn LeadNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn greeting(&self) -> String {
        self.replies.greeting()
    }

    /// Open a new conversation through the persistence gateway.
    pub fn start_session(&self, user_id: &str) -> String {
        let session_id = self.gateway.create_session(user_id);
        debug!(session_id = %session_id, user_id, "Session started");
        session_id
    }

    /// Forget everything held for a session and return a fresh greeting.
    pub fn reset(&self, session_id: &str) -> String {
        if self.sessions.remove(session_id) {
            info!(session_id, "Session reset");
        }
        self.replies.greeting()
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<Session> {
        let session = self.sessions.get(session_id)?;
        let guard = session.lock().await;
        Some(guard.clone())
    }

    /// Turns on which every backend failed.
    pub fn backend_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Handle one visitor message. Turns of the same session are serialized.
    pub async fn handle(&self, session_id: &str, user_text: &str) -> Reply {
        let entry = self.sessions.get_or_create(session_id);
        let mut session = entry.lock().await;

        let is_sentinel = user_text.trim() == self.config.session_start_sentinel;

        let reply = match self.respond(&mut session, session_id, user_text).await {
            Ok(reply) => reply,
            Err(e) => self.recover(session_id, e),
        };

        if reply.updates_context() {
            self.gate.remember(&mut session.memory, &reply.text);
        }
        session.state.last_response = Some(reply.text.clone());
        drop(session);

        if !is_sentinel {
            self.log_message(session_id, Sender::User, user_text);
        }
        self.log_message(session_id, Sender::Bot, &reply.text);

        reply
    }

    async fn respond(
        &self,
        session: &mut Session,
        session_id: &str,
        user_text: &str,
    ) -> Result<Reply, ChatError> {
        let text = user_text.trim();

        if text == self.config.session_start_sentinel {
            session.state.greeting_shown = true;
            return Ok(Reply::new(self.replies.greeting(), ReplySource::Greeting));
        }
        if text.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        // Contact details share no topic words with the previous reply, so
        // lead capture runs ahead of the relevance gate.
        if session.state.collecting {
            match self.leads.advance(&mut session.state, text) {
                LeadStep::Idle => {}
                LeadStep::Completed(confirmation) => {
                    self.capture_lead(session, session_id).await;
                    return Ok(Reply::new(confirmation, ReplySource::LeadFlow));
                }
                step => {
                    let prompt = step.text().unwrap_or_default().to_string();
                    return Ok(Reply::new(prompt, ReplySource::LeadFlow));
                }
            }
        }

        if !self.gate.is_relevant(&session.memory, text) {
            debug!(session_id, "Message failed relevance gate");
            return Ok(Reply::new(self.replies.off_topic(), ReplySource::OffTopic));
        }

        if let Some(reply) = self.answer_intent(session, text) {
            return Ok(reply);
        }

        self.generate(session, session_id, text).await
    }

    fn answer_intent(&self, session: &mut Session, text: &str) -> Option<Reply> {
        let intent = intent::classify(text)?;
        let kind = intent.kind();
        let reply = match intent {
            Intent::Greeting => {
                let text = if session.state.greeting_shown {
                    self.replies.greeting_again()
                } else {
                    self.replies.greeting()
                };
                session.state.greeting_shown = true;
                Reply::new(text, ReplySource::Greeting)
            }
            Intent::Services => Reply::new(self.kb.services_summary(), ReplySource::Knowledge(kind)),
            Intent::AiCapabilities => {
                Reply::new(self.replies.ai_capabilities(), ReplySource::Knowledge(kind))
            }
            Intent::Process => Reply::new(self.kb.process_summary(), ReplySource::Knowledge(kind)),
            Intent::Location => {
                Reply::new(self.replies.location(&self.kb), ReplySource::Knowledge(kind))
            }
            Intent::ProjectInterest { project_type } => {
                // Only one lead per session; afterwards project talk goes to the backends.
                if session.state.collecting || session.state.name.is_some() {
                    return None;
                }
                info!(project_type = %project_type, "Project interest detected, collecting lead");
                let prompt = self.leads.begin(&mut session.state, Some(project_type));
                Reply::new(prompt, ReplySource::LeadFlow)
            }
        };
        Some(reply)
    }

    async fn generate(
        &self,
        session: &mut Session,
        session_id: &str,
        text: &str,
    ) -> Result<Reply, ChatError> {
        let mut ctx = GenerationContext {
            memory: std::mem::take(&mut session.history),
            hint: self.kb.rule_context(text),
        };
        let result = self.backends.run(text, &mut ctx).await;
        session.history = ctx.memory;

        let generated = result.map_err(|e| self.backend_failed(session_id, e))?;
        let reply = shorten(&generated.text, self.config.max_response_chars);
        Ok(Reply::new(reply, ReplySource::Backend(generated.backend)))
    }

    fn backend_failed(&self, session_id: &str, err: BackendError) -> ChatError {
        if !matches!(err, BackendError::RateLimited) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            error!(session_id, error = %err, "All response backends failed");
        }
        ChatError::from(err)
    }

    fn recover(&self, session_id: &str, err: ChatError) -> Reply {
        match err {
            ChatError::EmptyInput => Reply::new(self.replies.clarify(), ReplySource::Clarify),
            ChatError::MessageTooLong(max) => {
                Reply::new(self.replies.too_long(max), ReplySource::TooLong)
            }
            ChatError::RateLimitExceeded => {
                warn!(session_id, "Rate limit reached, asking visitor to wait");
                Reply::new(TOO_BUSY, ReplySource::Busy)
            }
            other => {
                debug!(session_id, error = %other, "Replying with apology");
                Reply::new(APOLOGY, ReplySource::Apology)
            }
        }
    }

    async fn capture_lead(&self, session: &Session, session_id: &str) {
        let state = &session.state;
        let (Some(name), Some(email), Some(phone)) = (&state.name, &state.email, &state.phone)
        else {
            return;
        };
        let message = match state.project_type.as_deref() {
            Some(p) => format!("Interested in a {p} project"),
            None => "Interested in a project".to_string(),
        };
        let lead = ContactSubmission {
            name: name.clone(),
            email: email.clone(),
            phone: phone.clone(),
            message,
            project_type: state.project_type.clone(),
            session_id: session_id.to_string(),
        };

        let outcome = self.gateway.save_contact(&lead);
        if outcome.ok {
            info!(session_id, detail = %outcome.detail, "Lead saved");
        } else {
            error!(session_id, detail = %outcome.detail, "Failed to save lead");
        }

        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.notify(&lead).await;
        });
    }

    fn log_message(&self, session_id: &str, sender: Sender, content: &str) {
        if !self.gateway.save_message(session_id, sender, content) {
            error!(session_id, sender = %sender, "Failed to log chat message");
        }
    }
}
