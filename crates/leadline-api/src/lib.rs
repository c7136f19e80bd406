//! HTTP surface for the Leadline assistant: chat turns, company info,
//! session summaries and resets, and a health check.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
