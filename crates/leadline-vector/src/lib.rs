//! Leadline Vector crate - embedding services, cosine index and knowledge search.
//!
//! Provides an embedding service trait with a local hashing implementation
//! and an Ollama-backed one, an in-memory cosine index, and `KnowledgeSearch`
//! which answers top-k similarity queries over the company knowledge base.

pub mod embedding;
pub mod index;
pub mod search;

pub use embedding::{DynEmbeddingService, EmbeddingService, HashEmbedding, OllamaEmbedding};
pub use index::{SearchHit, VectorIndex};
pub use search::KnowledgeSearch;
