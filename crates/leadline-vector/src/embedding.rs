//! Embedding service trait and implementations.
//!
//! - `HashEmbedding` hashes lower-cased words into a fixed number of signed
//!   buckets. Texts sharing vocabulary land close together, which is enough
//!   to rank a handful of knowledge fragments without a model server.
//! - `OllamaEmbedding` calls an Ollama `/api/embeddings` endpoint.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use leadline_core::error::LeadlineError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Service for generating text embeddings.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, LeadlineError>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future` and so cannot be used as a
/// trait object. The blanket impl below boxes the future instead.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, LeadlineError>> + Send + 'a>>;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, LeadlineError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// HashEmbedding - local bag-of-words hashing
// ---------------------------------------------------------------------------

/// Deterministic bag-of-words embedding.
///
/// Each word is hashed to a bucket and a sign; the vector is the sum of the
/// word contributions, L2-normalized.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    dimensions: usize,
}

impl HashEmbedding {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = vec![0.0f32; self.dimensions];
        for word in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let h = hasher.finish();
            let bucket = (h % self.dimensions as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            result[bucket] += sign;
        }

        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }
        result
    }
}

impl Default for HashEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingService for HashEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LeadlineError> {
        if tokenize(text).next().is_none() {
            return Err(LeadlineError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }
        Ok(self.hash_to_vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

// ---------------------------------------------------------------------------
// OllamaEmbedding - remote embeddings endpoint
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embeddings from an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEmbedding {
    client: reqwest::Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedding {
    /// `dimensions` is the expected vector size; responses of a different
    /// length are rejected.
    pub fn new(url: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Result<Self, LeadlineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LeadlineError::Embedding(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            model: model.into(),
            dimensions,
        })
    }
}

impl EmbeddingService for OllamaEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LeadlineError> {
        if text.trim().is_empty() {
            return Err(LeadlineError::Embedding(
                "Cannot embed empty text".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| LeadlineError::Embedding(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LeadlineError::Embedding(format!(
                "embedding endpoint returned {status}"
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LeadlineError::Embedding(format!("malformed response: {e}")))?;

        if body.embedding.len() != self.dimensions {
            return Err(LeadlineError::Embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                body.embedding.len()
            )));
        }
        debug!(model = %self.model, dims = body.embedding.len(), "Embedded text");
        Ok(body.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
