//! In-memory vector index with brute-force cosine similarity search.
//!
//! The knowledge corpus is a handful of fragments, so an O(n) scan per query
//! is cheaper than maintaining a graph index.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use leadline_core::error::LeadlineError;
use leadline_core::types::KnowledgeFragment;

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    /// Cosine similarity score (-1.0 to 1.0).
    pub score: f64,
    pub fragment: KnowledgeFragment,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    fragment: KnowledgeFragment,
    /// Insertion order, used to break score ties deterministically.
    seq: u64,
}

/// In-memory vector index using brute-force cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Arc<RwLock<HashMap<Uuid, VectorEntry>>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment with its embedding. Overwrites any entry with the same ID.
    pub fn insert(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        fragment: KnowledgeFragment,
    ) -> Result<(), LeadlineError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| LeadlineError::Storage(format!("Lock poisoned: {}", e)))?;
        let seq = entries.get(&id).map(|e| e.seq).unwrap_or(entries.len() as u64);
        entries.insert(
            id,
            VectorEntry {
                embedding,
                fragment,
                seq,
            },
        );
        Ok(())
    }

    /// Return the k nearest fragments by cosine similarity, best first.
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, LeadlineError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| LeadlineError::Storage(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<(u64, SearchHit)> = entries
            .iter()
            .map(|(id, entry)| {
                (
                    entry.seq,
                    SearchHit {
                        id: *id,
                        score: cosine_similarity(query, &entry.embedding),
                        fragment: entry.fragment.clone(),
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadline_core::types::FragmentCategory;

    fn frag(text: &str) -> KnowledgeFragment {
        KnowledgeFragment {
            text: text.to_string(),
            category: FragmentCategory::Product,
        }
    }

    #[test]
    fn test_insert_and_search() {
        let index = VectorIndex::new();
        index.insert(Uuid::new_v4(), vec![1.0, 0.0], frag("a")).unwrap();
        index.insert(Uuid::new_v4(), vec![0.0, 1.0], frag("b")).unwrap();
        assert_eq!(index.len(), 2);

        let hits = index.search(&[1.0, 0.1], 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].fragment.text, "a");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_respects_k_limit() {
        let index = VectorIndex::new();
        for i in 0..10 {
            index
                .insert(Uuid::new_v4(), vec![1.0f32; 4], frag(&i.to_string()))
                .unwrap();
        }
        assert_eq!(index.search(&[1.0f32; 4], 3).unwrap().len(), 3);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = VectorIndex::new();
        for name in ["first", "second", "third"] {
            index.insert(Uuid::new_v4(), vec![1.0f32; 4], frag(name)).unwrap();
        }
        let hits = index.search(&[1.0f32; 4], 2).unwrap();
        assert_eq!(hits[0].fragment.text, "first");
        assert_eq!(hits[1].fragment.text, "second");
    }

    #[test]
    fn test_insert_overwrites() {
        let index = VectorIndex::new();
        let id = Uuid::new_v4();
        index.insert(id, vec![1.0f32; 4], frag("old")).unwrap();
        index.insert(id, vec![1.0f32; 4], frag("new")).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.search(&[1.0f32; 4], 1).unwrap()[0].fragment.text, "new");
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0f32; 100];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let mut a = vec![0.0f32; 100];
        let mut b = vec![0.0f32; 100];
        a[0] = 1.0;
        b[1] = 1.0;
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0f32; 100];
        let b = vec![1.0f32; 100];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0; 10], &[1.0; 20]), 0.0);
    }
}
