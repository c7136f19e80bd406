//! Repository implementations for SQLite-backed persistence.
//!
//! ConversationRepository, MessageRepository and ContactRepository operate
//! on the shared Database using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use leadline_core::error::LeadlineError;
use leadline_core::types::{ChatMessage, ContactStatus, ContactSubmission, Sender};

use crate::db::Database;

/// One row of the conversations table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub session_id: String,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
}

/// A stored contact form with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub id: i64,
    pub submission: ContactSubmission,
    pub submitted_at: DateTime<Utc>,
    pub status: ContactStatus,
}

/// Repository for conversation sessions.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Start a new conversation and return its generated session id.
    pub fn create(&self, user_id: &str) -> Result<String, LeadlineError> {
        let session_id = Uuid::new_v4().to_string();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (session_id, user_id, start_time) VALUES (?1, ?2, ?3)",
                rusqlite::params![session_id, user_id, Utc::now().timestamp_millis()],
            )
            .map_err(|e| LeadlineError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;
        Ok(session_id)
    }

    /// Register a session id chosen by the client, if it is not known yet.
    pub fn ensure(&self, session_id: &str, user_id: &str) -> Result<(), LeadlineError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO conversations (session_id, user_id, start_time)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![session_id, user_id, Utc::now().timestamp_millis()],
            )
            .map_err(|e| LeadlineError::Storage(format!("Failed to register conversation: {}", e)))?;
            Ok(())
        })
    }

    pub fn find(&self, session_id: &str) -> Result<Option<Conversation>, LeadlineError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT session_id, user_id, start_time FROM conversations WHERE session_id = ?1",
                rusqlite::params![session_id],
                |row| {
                    Ok(Conversation {
                        session_id: row.get(0)?,
                        user_id: row.get(1)?,
                        start_time: millis_to_datetime(row.get(2)?),
                    })
                },
            )
            .optional()
            .map_err(|e| LeadlineError::Storage(e.to_string()))
        })
    }
}

/// Repository for the append-only message log.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append one message. Returns the row id.
    pub fn append(&self, message: &ChatMessage) -> Result<i64, LeadlineError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (session_id, sender, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    message.session_id,
                    message.sender.as_str(),
                    message.content,
                    message.timestamp.timestamp_millis(),
                ],
            )
            .map_err(|e| LeadlineError::Storage(format!("Failed to save message: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All messages of a session, oldest first.
    pub fn list_by_session(&self, session_id: &str) -> Result<Vec<ChatMessage>, LeadlineError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT session_id, sender, content, timestamp FROM messages
                     WHERE session_id = ?1
                     ORDER BY timestamp ASC, id ASC",
                )
                .map_err(|e| LeadlineError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![session_id], |row| {
                    let sender: String = row.get(1)?;
                    Ok(ChatMessage {
                        session_id: row.get(0)?,
                        sender: Sender::parse(&sender),
                        content: row.get(2)?,
                        timestamp: millis_to_datetime(row.get(3)?),
                    })
                })
                .map_err(|e| LeadlineError::Storage(e.to_string()))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| LeadlineError::Storage(e.to_string()))
        })
    }

    pub fn count_by_session(&self, session_id: &str) -> Result<u64, LeadlineError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
                    rusqlite::params![session_id],
                    |row| row.get(0),
                )
                .map_err(|e| LeadlineError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Repository for captured leads.
pub struct ContactRepository {
    db: Arc<Database>,
}

impl ContactRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a submission with status `new`. Returns the row id.
    pub fn save(&self, lead: &ContactSubmission) -> Result<i64, LeadlineError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contact_forms
                 (name, email, phone, message, project_type, session_id, submission_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    lead.name,
                    lead.email,
                    lead.phone,
                    lead.message,
                    lead.project_type,
                    lead.session_id,
                    Utc::now().timestamp_millis(),
                ],
            )
            .map_err(|e| LeadlineError::Storage(format!("Failed to save contact: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Submissions with the given status, newest first.
    pub fn list_by_status(&self, status: ContactStatus) -> Result<Vec<ContactRecord>, LeadlineError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, name, email, phone, message, project_type, session_id,
                            submission_date, status
                     FROM contact_forms
                     WHERE status = ?1
                     ORDER BY submission_date DESC, id DESC",
                )
                .map_err(|e| LeadlineError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![status.as_str()], row_to_contact)
                .map_err(|e| LeadlineError::Storage(e.to_string()))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| LeadlineError::Storage(e.to_string()))
        })
    }

    /// Returns false when no submission has that id.
    pub fn update_status(&self, id: i64, status: ContactStatus) -> Result<bool, LeadlineError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE contact_forms SET status = ?1 WHERE id = ?2",
                    rusqlite::params![status.as_str(), id],
                )
                .map_err(|e| LeadlineError::Storage(format!("Failed to update contact: {}", e)))?;
            Ok(changed > 0)
        })
    }
}

fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<ContactRecord> {
    let status: String = row.get(8)?;
    Ok(ContactRecord {
        id: row.get(0)?,
        submission: ContactSubmission {
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            message: row.get(4)?,
            project_type: row.get(5)?,
            session_id: row.get(6)?,
        },
        submitted_at: millis_to_datetime(row.get(7)?),
        status: ContactStatus::parse(&status),
    })
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn make_lead(session_id: &str) -> ContactSubmission {
        ContactSubmission {
            name: "Jane".to_string(),
            email: "jane@co.com".to_string(),
            phone: "555-123-4567".to_string(),
            message: "Interested in a mobile project".to_string(),
            project_type: Some("mobile".to_string()),
            session_id: session_id.to_string(),
        }
    }

    fn message(session_id: &str, sender: Sender, content: &str, at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            session_id: session_id.to_string(),
            sender,
            content: content.to_string(),
            timestamp: at,
        }
    }

    // ========================================================================
    // ConversationRepository tests
    // ========================================================================

    #[test]
    fn test_create_and_find_conversation() {
        let repo = ConversationRepository::new(make_db());
        let id = repo.create("visitor-1").unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let found = repo.find(&id).unwrap().unwrap();
        assert_eq!(found.user_id, "visitor-1");
        assert!(repo.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let repo = ConversationRepository::new(make_db());
        repo.ensure("client-chosen", "a").unwrap();
        repo.ensure("client-chosen", "b").unwrap();
        assert_eq!(repo.find("client-chosen").unwrap().unwrap().user_id, "a");
    }

    // ========================================================================
    // MessageRepository tests
    // ========================================================================

    #[test]
    fn test_messages_listed_in_time_order() {
        let db = make_db();
        let conversations = ConversationRepository::new(db.clone());
        let messages = MessageRepository::new(db);
        let sid = conversations.create("u").unwrap();

        let t0 = Utc::now();
        messages
            .append(&message(&sid, Sender::Bot, "second", t0 + Duration::seconds(5)))
            .unwrap();
        messages.append(&message(&sid, Sender::User, "first", t0)).unwrap();

        let listed = messages.list_by_session(&sid).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "first");
        assert_eq!(listed[0].sender, Sender::User);
        assert_eq!(listed[1].content, "second");
        assert_eq!(listed[1].sender, Sender::Bot);
        assert_eq!(listed[0].timestamp.timestamp_millis(), t0.timestamp_millis());
        assert_eq!(messages.count_by_session(&sid).unwrap(), 2);
    }

    #[test]
    fn test_same_timestamp_keeps_insert_order() {
        let db = make_db();
        let sid = ConversationRepository::new(db.clone()).create("u").unwrap();
        let messages = MessageRepository::new(db);
        let t = Utc::now();
        for content in ["a", "b", "c"] {
            messages.append(&message(&sid, Sender::User, content, t)).unwrap();
        }
        let listed: Vec<String> = messages
            .list_by_session(&sid)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(listed, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_message_for_unknown_session_fails() {
        let messages = MessageRepository::new(make_db());
        let result = messages.append(&message("ghost", Sender::User, "hi", Utc::now()));
        assert!(matches!(result, Err(LeadlineError::Storage(_))));
    }

    // ========================================================================
    // ContactRepository tests
    // ========================================================================

    #[test]
    fn test_contact_save_and_list() {
        let repo = ContactRepository::new(make_db());
        let id = repo.save(&make_lead("s1")).unwrap();

        let new = repo.list_by_status(ContactStatus::New).unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].id, id);
        assert_eq!(new[0].submission, make_lead("s1"));
        assert!(repo.list_by_status(ContactStatus::Contacted).unwrap().is_empty());
    }

    #[test]
    fn test_contact_status_update() {
        let repo = ContactRepository::new(make_db());
        let id = repo.save(&make_lead("s1")).unwrap();

        assert!(repo.update_status(id, ContactStatus::Contacted).unwrap());
        assert!(!repo.update_status(id + 100, ContactStatus::Closed).unwrap());

        let contacted = repo.list_by_status(ContactStatus::Contacted).unwrap();
        assert_eq!(contacted.len(), 1);
        assert_eq!(contacted[0].status, ContactStatus::Contacted);
    }

    #[test]
    fn test_contact_without_project_type() {
        let repo = ContactRepository::new(make_db());
        let mut lead = make_lead("s2");
        lead.project_type = None;
        repo.save(&lead).unwrap();
        let listed = repo.list_by_status(ContactStatus::New).unwrap();
        assert_eq!(listed[0].submission.project_type, None);
    }
}
