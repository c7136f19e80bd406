//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use leadline_chat::{ConversationSummarizer, DialogueOrchestrator};
use leadline_storage::Database;

/// Shared application state. Cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DialogueOrchestrator>,
    /// SQLite database holding the message log read by summaries.
    pub database: Arc<Database>,
    pub summarizer: ConversationSummarizer,
    /// Listen port, used to build the CORS allow-list.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<DialogueOrchestrator>, database: Arc<Database>, port: u16) -> Self {
        Self {
            orchestrator,
            database,
            summarizer: ConversationSummarizer,
            port,
            start_time: Instant::now(),
        }
    }
}
