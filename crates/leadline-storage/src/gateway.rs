//! SQLite-backed persistence gateway for the dialogue layer.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use leadline_core::types::{ChatMessage, ContactSubmission, SaveOutcome, Sender};
use leadline_core::PersistenceGateway;

use crate::db::Database;
use crate::repository::{ContactRepository, ConversationRepository, MessageRepository};

/// Owner recorded for sessions first seen through a message write.
const UNKNOWN_USER: &str = "anonymous";

pub struct SqliteGateway {
    conversations: ConversationRepository,
    messages: MessageRepository,
    contacts: ContactRepository,
}

impl SqliteGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            conversations: ConversationRepository::new(db.clone()),
            messages: MessageRepository::new(db.clone()),
            contacts: ContactRepository::new(db),
        }
    }
}

impl PersistenceGateway for SqliteGateway {
    fn save_contact(&self, contact: &ContactSubmission) -> SaveOutcome {
        match self.contacts.save(contact) {
            Ok(id) => SaveOutcome::ok(format!("contact {id} saved")),
            Err(e) => SaveOutcome::failed(e.to_string()),
        }
    }

    fn save_message(&self, session_id: &str, sender: Sender, content: &str) -> bool {
        if let Err(e) = self.conversations.ensure(session_id, UNKNOWN_USER) {
            warn!(session_id, error = %e, "Could not register conversation");
            return false;
        }
        let message = ChatMessage {
            session_id: session_id.to_string(),
            sender,
            content: content.to_string(),
            timestamp: Utc::now(),
        };
        match self.messages.append(&message) {
            Ok(_) => true,
            Err(e) => {
                warn!(session_id, error = %e, "Could not append message");
                false
            }
        }
    }

    fn create_session(&self, user_id: &str) -> String {
        match self.conversations.create(user_id) {
            Ok(id) => id,
            Err(e) => {
                // The conversation still works; its log rows register the id later.
                error!(user_id, error = %e, "Failed to create conversation, using unsaved id");
                Uuid::new_v4().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> (SqliteGateway, Arc<Database>) {
        let db = Arc::new(Database::in_memory().unwrap());
        (SqliteGateway::new(db.clone()), db)
    }

    #[test]
    fn test_create_session_persists_conversation() {
        let (gw, db) = gateway();
        let sid = gw.create_session("visitor");
        let found = ConversationRepository::new(db).find(&sid).unwrap().unwrap();
        assert_eq!(found.user_id, "visitor");
    }

    #[test]
    fn test_save_message_registers_unknown_session() {
        let (gw, db) = gateway();
        assert!(gw.save_message("client-id", Sender::User, "hello"));
        assert!(gw.save_message("client-id", Sender::Bot, "hi there"));

        let messages = MessageRepository::new(db.clone()).list_by_session("client-id").unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "hi there");
        let conv = ConversationRepository::new(db).find("client-id").unwrap().unwrap();
        assert_eq!(conv.user_id, UNKNOWN_USER);
    }

    #[test]
    fn test_save_contact_reports_row() {
        let (gw, _db) = gateway();
        let outcome = gw.save_contact(&ContactSubmission {
            name: "Jane".into(),
            email: "jane@co.com".into(),
            phone: "555-123-4567".into(),
            message: "Interested in a mobile project".into(),
            project_type: Some("mobile".into()),
            session_id: "s1".into(),
        });
        assert!(outcome.ok);
        assert!(outcome.detail.starts_with("contact "));
    }

    #[test]
    fn test_failures_become_false() {
        let (gw, db) = gateway();
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE messages;")
                .map_err(|e| leadline_core::LeadlineError::Storage(e.to_string()))
        })
        .unwrap();
        assert!(!gw.save_message("s1", Sender::User, "hello"));

        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE contact_forms;")
                .map_err(|e| leadline_core::LeadlineError::Storage(e.to_string()))
        })
        .unwrap();
        let outcome = gw.save_contact(&ContactSubmission {
            name: "Jane".into(),
            email: "jane@co.com".into(),
            phone: "5551234567".into(),
            message: String::new(),
            project_type: None,
            session_id: "s1".into(),
        });
        assert!(!outcome.ok);
        assert!(outcome.detail.contains("Failed to save contact"));
    }
}
