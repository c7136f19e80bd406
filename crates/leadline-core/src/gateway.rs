use crate::types::{ContactSubmission, SaveOutcome, Sender};

/// Storage collaborator used by the dialogue layer.
///
/// Implementations must not panic or return errors: failures are reported
/// through [`SaveOutcome`] or `false` and the caller only logs them.
pub trait PersistenceGateway: Send + Sync {
    /// Store a completed lead.
    fn save_contact(&self, contact: &ContactSubmission) -> SaveOutcome;

    /// Append one line to the session's message log.
    fn save_message(&self, session_id: &str, sender: Sender, content: &str) -> bool;

    /// Register a new conversation and return its session id.
    fn create_session(&self, user_id: &str) -> String;
}

/// Gateway that stores nothing. Used for console runs and tests that do not
/// care about persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullGateway;

impl PersistenceGateway for NullGateway {
    fn save_contact(&self, _contact: &ContactSubmission) -> SaveOutcome {
        SaveOutcome::ok("discarded")
    }

    fn save_message(&self, _session_id: &str, _sender: Sender, _content: &str) -> bool {
        true
    }

    fn create_session(&self, _user_id: &str) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
