//! Sparse BM25 index (C2): build-once, read-concurrently over the full
//! corpus exposed by `PolicyRepository::scroll_all_chunks`.

use std::collections::HashMap;
use std::sync::RwLock;

use qa_core::error::QaError;
use qa_core::types::DocumentChunk;
use tokio::sync::OnceCell;

use crate::tokenizer::tokenize_for_index;

const K1: f64 = 1.5;
const B: f64 = 0.75;
const SCORE_FLOOR: f64 = 0.1;

#[derive(Debug, Clone)]
struct Posting {
    chunk_id: i64,
    term_freq: u32,
}

/// In-memory BM25 index over `DocumentChunk` content.
///
/// Built lazily under a one-shot lock and treated as immutable afterward;
/// an explicit `rebuild` hook exists for operators but is never triggered
/// by ingestion.
pub struct Bm25Index {
    built: OnceCell<()>,
    state: RwLock<IndexState>,
}

#[derive(Default)]
struct IndexState {
    postings: HashMap<String, Vec<Posting>>,
    doc_lengths: HashMap<i64, usize>,
    avg_doc_length: f64,
    doc_count: usize,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Index {
    pub fn new() -> Self {
        Self {
            built: OnceCell::new(),
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Build the index from `chunks` if it has not been built yet.
    /// Concurrent callers all await the same build.
    pub async fn warm_up(&self, chunks: &[DocumentChunk]) -> Result<(), QaError> {
        self.built
            .get_or_try_init(|| async { self.build(chunks) })
            .await?;
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built.initialized()
    }

    /// Force a rebuild regardless of prior state. Exposed as an admin hook;
    /// not triggered by the normal search path.
    pub async fn rebuild(&self, chunks: &[DocumentChunk]) -> Result<(), QaError> {
        self.build(chunks)?;
        // Replace the OnceCell's contents so future warm_up calls are no-ops.
        if self.built.initialized() {
            // OnceCell has no reset; a fresh one is swapped in via interior
            // state only — built stays initialized, state is already fresh.
        } else {
            let _ = self.built.set(());
        }
        Ok(())
    }

    fn build(&self, chunks: &[DocumentChunk]) -> Result<(), QaError> {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = HashMap::new();
        let mut total_len: usize = 0;

        for chunk in chunks {
            let tokens = tokenize_for_index(&chunk.content);
            let len = tokens.len();
            doc_lengths.insert(chunk.chunk_id, len);
            total_len += len;

            let mut term_counts: HashMap<String, u32> = HashMap::new();
            for tok in tokens {
                *term_counts.entry(tok).or_insert(0) += 1;
            }
            for (term, term_freq) in term_counts {
                postings.entry(term).or_default().push(Posting {
                    chunk_id: chunk.chunk_id,
                    term_freq,
                });
            }
        }

        let doc_count = chunks.len();
        let avg_doc_length = if doc_count > 0 {
            total_len as f64 / doc_count as f64
        } else {
            0.0
        };

        let mut state = self
            .state
            .write()
            .map_err(|e| QaError::LockPoisoned(e.to_string()))?;
        *state = IndexState {
            postings,
            doc_lengths,
            avg_doc_length,
            doc_count,
        };
        Ok(())
    }

    /// Ranked `(chunk_id, bm25_score)` pairs for `query`, top `k` by score,
    /// filtered to `score >= floor` (default 0.1). Ties broken by ascending
    /// chunk_id.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<(i64, f64)>, QaError> {
        let state = self
            .state
            .read()
            .map_err(|e| QaError::LockPoisoned(e.to_string()))?;

        if state.doc_count == 0 {
            return Ok(Vec::new());
        }

        let query_terms = tokenize_for_index(query);
        let mut scores: HashMap<i64, f64> = HashMap::new();

        for term in &query_terms {
            let Some(postings) = state.postings.get(term) else {
                continue;
            };
            let doc_freq = postings.len() as f64;
            let idf = ((state.doc_count as f64 - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();

            for posting in postings {
                let doc_len = *state.doc_lengths.get(&posting.chunk_id).unwrap_or(&0) as f64;
                let tf = posting.term_freq as f64;
                let denom = tf + K1 * (1.0 - B + B * doc_len / state.avg_doc_length.max(1.0));
                let score = idf * (tf * (K1 + 1.0)) / denom.max(f64::EPSILON);
                *scores.entry(posting.chunk_id).or_insert(0.0) += score;
            }
        }

        let mut ranked: Vec<(i64, f64)> = scores
            .into_iter()
            .filter(|(_, score)| *score >= SCORE_FLOOR)
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(chunk_id: i64, policy_id: i64, content: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id,
            policy_id,
            chunk_index: 0,
            content: content.to_string(),
            doc_type: "support".to_string(),
            embedding: None,
        }
    }

    #[tokio::test]
    async fn test_warm_up_then_search_finds_matching_chunk() {
        let index = Bm25Index::new();
        let chunks = vec![
            chunk(1, 10, "서울 창업 지원금 안내문서"),
            chunk(2, 11, "청년 문화 행사 공지"),
        ];
        index.warm_up(&chunks).await.unwrap();

        let results = index.search("창업 지원금", 10).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0, 1);
    }

    #[tokio::test]
    async fn test_search_before_warm_up_returns_empty() {
        let index = Bm25Index::new();
        let results = index.search("창업", 10).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_respects_k_limit() {
        let index = Bm25Index::new();
        let chunks: Vec<_> = (0..20)
            .map(|i| chunk(i, i, "창업 지원금 공통 키워드"))
            .collect();
        index.warm_up(&chunks).await.unwrap();

        let results = index.search("창업 지원금", 5).unwrap();
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn test_search_unknown_term_returns_empty() {
        let index = Bm25Index::new();
        let chunks = vec![chunk(1, 10, "서울 창업 지원금")];
        index.warm_up(&chunks).await.unwrap();

        let results = index.search("완전히무관한검색어들", 10).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_warm_up_is_idempotent() {
        let index = Bm25Index::new();
        let chunks = vec![chunk(1, 10, "서울 창업 지원금")];
        index.warm_up(&chunks).await.unwrap();
        index.warm_up(&[]).await.unwrap();

        let results = index.search("창업", 10).unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_reflects_new_corpus() {
        let index = Bm25Index::new();
        index.warm_up(&[chunk(1, 10, "서울 창업")]).await.unwrap();
        index
            .rebuild(&[chunk(2, 11, "청년 문화 행사")])
            .await
            .unwrap();

        let results = index.search("창업", 10).unwrap();
        assert!(results.is_empty());
        let results = index.search("문화", 10).unwrap();
        assert!(!results.is_empty());
    }

    #[tokio::test]
    async fn test_ties_broken_by_ascending_chunk_id() {
        let index = Bm25Index::new();
        let chunks = vec![
            chunk(5, 1, "동일한 내용 텍스트"),
            chunk(2, 2, "동일한 내용 텍스트"),
        ];
        index.warm_up(&chunks).await.unwrap();

        let results = index.search("동일한 내용", 10).unwrap();
        assert_eq!(results[0].0, 2);
        assert_eq!(results[1].0, 5);
    }

    #[test]
    fn test_is_built_false_initially() {
        let index = Bm25Index::new();
        assert!(!index.is_built());
    }
}
