//! Per-session dialogue state and the in-memory session store.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use leadline_llm::Turn;

/// Lead capture and greeting progress for one conversation.
///
/// Contact fields are filled strictly in the order name, email, phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub collecting: bool,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub project_type: Option<String>,
    pub greeting_shown: bool,
    pub last_response: Option<String>,
}

/// Topic memory consulted by the relevance gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMemory {
    pub previous_context: Option<String>,
    pub context_keywords: BTreeSet<String>,
}

impl ContextMemory {
    pub fn has_context(&self) -> bool {
        !self.context_keywords.is_empty()
    }
}

/// Everything the orchestrator keeps for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: ConversationState,
    pub memory: ContextMemory,
    /// Exchanges replayed by the retrieval backend.
    pub history: Vec<Turn>,
}

/// Session map keyed by session id.
///
/// The outer lock is only held to look up or insert an entry. Each session
/// has its own async mutex, held for a whole turn, so turns of one session
/// run one at a time while different sessions proceed in parallel.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<tokio::sync::Mutex<Session>> {
        let mut map = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        Arc::clone(map.entry(session_id.to_string()).or_default())
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<tokio::sync::Mutex<Session>>> {
        let map = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        map.get(session_id).cloned()
    }

    /// Drop a session's state. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        let mut map = self.sessions.lock().unwrap_or_else(|p| p.into_inner());
        map.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
