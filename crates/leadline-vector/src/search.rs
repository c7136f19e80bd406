//! Similarity search over the knowledge base.
//!
//! `KnowledgeSearch` embeds every knowledge fragment once at build time and
//! answers `search(query, k)` by embedding the query and scanning the index.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use leadline_core::error::LeadlineError;
use leadline_core::knowledge::KnowledgeBase;
use leadline_core::types::KnowledgeFragment;

use crate::embedding::{DynEmbeddingService, EmbeddingService, HashEmbedding};
use crate::index::VectorIndex;

pub struct KnowledgeSearch {
    index: Arc<VectorIndex>,
    embedder: Box<dyn DynEmbeddingService>,
}

impl std::fmt::Debug for KnowledgeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeSearch")
            .field("fragments", &self.index.len())
            .field("dimensions", &self.embedder.dimensions())
            .finish()
    }
}

impl KnowledgeSearch {
    /// Embed and index every fragment of the knowledge base.
    pub async fn build(
        kb: &KnowledgeBase,
        embedder: impl EmbeddingService + 'static,
    ) -> Result<Self, LeadlineError> {
        Self::build_dyn(kb, Box::new(embedder)).await
    }

    pub async fn build_dyn(
        kb: &KnowledgeBase,
        embedder: Box<dyn DynEmbeddingService>,
    ) -> Result<Self, LeadlineError> {
        let index = Arc::new(VectorIndex::new());
        for fragment in kb.fragments() {
            let embedding = embedder.embed_boxed(&fragment.text).await?;
            index.insert(Uuid::new_v4(), embedding, fragment)?;
        }
        info!(
            fragments = index.len(),
            dimensions = embedder.dimensions(),
            "Knowledge index built"
        );
        Ok(Self { index, embedder })
    }

    /// Build with the given embedder, falling back to local hashing when
    /// the embedder is unavailable at startup.
    pub async fn build_or_hash(
        kb: &KnowledgeBase,
        embedder: Box<dyn DynEmbeddingService>,
        fallback_dimensions: usize,
    ) -> Result<Self, LeadlineError> {
        match Self::build_dyn(kb, embedder).await {
            Ok(search) => Ok(search),
            Err(e) => {
                warn!(error = %e, "Embedding provider unavailable, using hashed embeddings");
                Self::build(kb, HashEmbedding::new(fallback_dimensions)).await
            }
        }
    }

    /// Top-k fragments most similar to `query`, best first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeFragment>, LeadlineError> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_boxed(query).await?;
        let hits = self.index.search(&query_vec, k)?;
        Ok(hits.into_iter().map(|h| h.fragment).collect())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadline_core::types::FragmentCategory;

    struct FailingEmbedding;

    impl EmbeddingService for FailingEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LeadlineError> {
            Err(LeadlineError::Embedding("offline".into()))
        }

        fn dimensions(&self) -> usize {
            8
        }
    }

    async fn search() -> KnowledgeSearch {
        let kb = KnowledgeBase::builtin().unwrap();
        KnowledgeSearch::build(&kb, HashEmbedding::default()).await.unwrap()
    }

    #[tokio::test]
    async fn test_build_indexes_every_fragment() {
        let s = search().await;
        assert_eq!(s.len(), 4);
    }

    #[tokio::test]
    async fn test_search_returns_k_fragments() {
        let s = search().await;
        let hits = s.search("inventory management system", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_ranks_overlapping_fragment_first() {
        let s = search().await;
        let hits = s
            .search("customer support chatbot that answers questions", 1)
            .await
            .unwrap();
        assert_eq!(hits[0].category, FragmentCategory::Product);
        assert!(hits[0].text.starts_with("ServeDesk"));
    }

    #[tokio::test]
    async fn test_search_zero_k() {
        let s = search().await;
        assert!(s.search("anything", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_or_hash_falls_back() {
        let kb = KnowledgeBase::builtin().unwrap();
        let s = KnowledgeSearch::build_or_hash(&kb, Box::new(FailingEmbedding), 64)
            .await
            .unwrap();
        assert_eq!(s.len(), 4);
        assert!(!s.search("erp", 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_propagates_embedding_error() {
        let kb = KnowledgeBase::builtin().unwrap();
        let err = KnowledgeSearch::build(&kb, FailingEmbedding).await.unwrap_err();
        assert!(matches!(err, LeadlineError::Embedding(_)));
    }
}
