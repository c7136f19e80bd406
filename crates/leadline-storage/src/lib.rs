//! SQLite persistence for conversations, the message log and captured leads.

pub mod db;
pub mod gateway;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use gateway::SqliteGateway;
pub use repository::{
    ContactRecord, ContactRepository, Conversation, ConversationRepository, MessageRepository,
};
