pub mod config;
pub mod error;
pub mod gateway;
pub mod knowledge;
pub mod types;

pub use config::LeadlineConfig;
pub use error::{LeadlineError, Result};
pub use gateway::{NullGateway, PersistenceGateway};
pub use knowledge::KnowledgeBase;
pub use types::*;
