//! Scripted doubles for the model and backend traits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{GenerationContext, ResponseBackend};
use crate::error::BackendError;
use crate::ollama::{CompletionRequest, LanguageModel};

/// Replays canned completions in order and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    fail: bool,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(BackendError::Connection("scripted failure".into()));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BackendError::Connection("script exhausted".into()))
    }
}

/// Backend that always returns the same outcome and counts its calls.
pub struct ScriptedBackend {
    name: &'static str,
    reply: Option<String>,
    error: fn() -> BackendError,
    calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn ok(name: &'static str, reply: &str) -> Self {
        Self {
            name,
            reply: Some(reply.to_string()),
            error: || BackendError::Connection("unused".into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn err(name: &'static str, error: fn() -> BackendError) -> Self {
        Self {
            name,
            reply: None,
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseBackend for ScriptedBackend {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        _user_text: &str,
        _ctx: &mut GenerationContext,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err((self.error)()),
        }
    }
}
