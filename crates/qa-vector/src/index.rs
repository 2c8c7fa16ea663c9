//! In-memory dense vector store with brute-force cosine similarity search.
//!
//! A real vector database is out of scope; this adapter is the reference
//! implementation needed to run and test the crate. All operations are
//! O(n) for search, acceptable for the corpus sizes this crate targets.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use qa_core::error::QaError;
use qa_core::ports::{DenseStore, Filter};
use qa_core::types::{DocumentChunk, MatchType, PolicyId, SearchHit};

#[derive(Debug, Clone)]
struct Entry {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// Brute-force cosine-similarity store, keyed internally by chunk id.
///
/// Thread-safe via interior `RwLock`. `dense_search` aggregates multiple
/// matching chunks of the same policy down to the best-scoring one before
/// returning, since [`SearchHit`] carries a `policy_id`, not a chunk id.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<i64, Entry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or overwrite a chunk's embedding.
    pub fn insert(&self, chunk: DocumentChunk, embedding: Vec<f32>) -> Result<(), QaError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| QaError::LockPoisoned(e.to_string()))?;
        let chunk_id = chunk.chunk_id;
        entries.insert(chunk_id, Entry { chunk, embedding });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn chunk_matches_filter(chunk: &DocumentChunk, filter: &Filter) -> bool {
    if let Some(policy_id) = filter.get("policy_id") {
        if policy_id.parse::<PolicyId>() != Ok(chunk.policy_id) {
            return false;
        }
    }
    if let Some(doc_type) = filter.get("doc_type") {
        if doc_type != &chunk.doc_type {
            return false;
        }
    }
    true
}

/// Returns 0.0 if either vector has zero magnitude or the lengths mismatch.
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

#[async_trait]
impl DenseStore for InMemoryVectorStore {
    async fn dense_search(
        &self,
        query_vec: &[f32],
        k: usize,
        filter: &Filter,
        min_score: f64,
    ) -> Result<Vec<SearchHit>, QaError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| QaError::LockPoisoned(e.to_string()))?;

        let mut best_per_policy: HashMap<PolicyId, SearchHit> = HashMap::new();
        for entry in entries.values() {
            if !chunk_matches_filter(&entry.chunk, filter) {
                continue;
            }
            let score = cosine_similarity(query_vec, &entry.embedding);
            if score < min_score {
                continue;
            }
            let better = best_per_policy
                .get(&entry.chunk.policy_id)
                .map(|existing| score > existing.score)
                .unwrap_or(true);
            if better {
                best_per_policy.insert(
                    entry.chunk.policy_id,
                    SearchHit {
                        policy_id: entry.chunk.policy_id,
                        score,
                        match_type: MatchType::Dense,
                        matched_excerpt: entry.chunk.content.clone(),
                    },
                );
            }
        }

        let mut hits: Vec<SearchHit> = best_per_policy.into_values().collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn scroll(&self, filter: &Filter, limit: usize) -> Result<Vec<DocumentChunk>, QaError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| QaError::LockPoisoned(e.to_string()))?;

        let mut chunks: Vec<DocumentChunk> = entries
            .values()
            .filter(|entry| chunk_matches_filter(&entry.chunk, filter))
            .map(|entry| DocumentChunk {
                embedding: None,
                ..entry.chunk.clone()
            })
            .collect();
        chunks.sort_by_key(|c| c.chunk_id);
        chunks.truncate(limit);
        Ok(chunks)
    }
}
