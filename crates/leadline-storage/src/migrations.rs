//! Database schema migrations.
//!
//! Version 1 creates the conversations, messages and contact_forms tables.
//! Timestamps are stored as milliseconds since the Unix epoch.

use rusqlite::Connection;
use tracing::info;

use leadline_core::error::LeadlineError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), LeadlineError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| LeadlineError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| LeadlineError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

fn apply_v1(conn: &Connection) -> Result<(), LeadlineError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            session_id      TEXT PRIMARY KEY NOT NULL,
            user_id         TEXT NOT NULL,
            start_time      INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversations (user_id, start_time DESC);

        -- Append-only chat log.
        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id      TEXT NOT NULL,
            sender          TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
            content         TEXT NOT NULL,
            timestamp       INTEGER NOT NULL,
            FOREIGN KEY (session_id) REFERENCES conversations(session_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_session
            ON messages (session_id, timestamp ASC);

        CREATE TABLE IF NOT EXISTS contact_forms (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT NOT NULL,
            email           TEXT NOT NULL,
            phone           TEXT NOT NULL,
            message         TEXT NOT NULL DEFAULT '',
            project_type    TEXT,
            session_id      TEXT NOT NULL,
            submission_date INTEGER NOT NULL,
            status          TEXT NOT NULL DEFAULT 'new'
                            CHECK (status IN ('new', 'contacted', 'closed'))
        );

        CREATE INDEX IF NOT EXISTS idx_contact_forms_status
            ON contact_forms (status, submission_date DESC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| LeadlineError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_message_requires_conversation() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let orphan = conn.execute(
            "INSERT INTO messages (session_id, sender, content, timestamp)
             VALUES ('missing', 'user', 'hi', 0)",
            [],
        );
        assert!(orphan.is_err());

        conn.execute(
            "INSERT INTO conversations (session_id, user_id, start_time) VALUES ('s1', 'u1', 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (session_id, sender, content, timestamp)
             VALUES ('s1', 'user', 'hi', 0)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_sender_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO conversations (session_id, user_id, start_time) VALUES ('s1', 'u1', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (session_id, sender, content, timestamp)
             VALUES ('s1', 'admin', 'hi', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_contact_status_defaults_to_new() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO contact_forms (name, email, phone, session_id, submission_date)
             VALUES ('Jane', 'jane@co.com', '5551234567', 's1', 0)",
            [],
        )
        .unwrap();

        let status: String = conn
            .query_row("SELECT status FROM contact_forms", [], |row| row.get(0))
            .unwrap();
        assert_eq!(status, "new");

        let bad = conn.execute("UPDATE contact_forms SET status = 'lost'", []);
        assert!(bad.is_err());
    }
}
