//! Hybrid searcher (C3): fuses dense and sparse retrieval via Reciprocal
//! Rank Fusion (or a weighted-average alternative), aggregating chunk-level
//! sparse hits up to policy level to match the dense store's contract.

use std::collections::HashMap;
use std::sync::Arc;

use qa_core::config::{FusionMode, SearchConfig};
use qa_core::error::QaError;
use qa_core::ports::{DenseStore, Filter};
use qa_core::types::{DocumentChunk, MatchType, PolicyId, SearchHit};

use crate::bm25::Bm25Index;
use crate::embedding::DynEmbeddingService;

struct RankedHit {
    policy_id: PolicyId,
    score: f64,
    matched_excerpt: String,
}

/// Combines a [`DynEmbeddingService`], a [`DenseStore`], and a [`Bm25Index`]
/// into one fused search surface.
pub struct HybridSearcher {
    embedder: Box<dyn DynEmbeddingService>,
    dense_store: Arc<dyn DenseStore>,
    bm25: Arc<Bm25Index>,
    /// chunk_id -> chunk, used to resolve BM25's chunk-level hits back to
    /// a policy id and an excerpt. Built once from the same corpus snapshot
    /// passed to `bm25.warm_up`.
    chunk_lookup: HashMap<i64, DocumentChunk>,
}

impl HybridSearcher {
    pub fn new(
        embedder: Box<dyn DynEmbeddingService>,
        dense_store: Arc<dyn DenseStore>,
        bm25: Arc<Bm25Index>,
        chunks: &[DocumentChunk],
    ) -> Self {
        let chunk_lookup = chunks.iter().map(|c| (c.chunk_id, c.clone())).collect();
        Self {
            embedder,
            dense_store,
            bm25,
            chunk_lookup,
        }
    }

    /// Fused, threshold-filtered, policy-level search. Never raises on
    /// empty results.
    pub async fn search(
        &self,
        query: &str,
        filter: &Filter,
        config: &SearchConfig,
        threshold: f64,
    ) -> Result<Vec<SearchHit>, QaError> {
        let query_vec = self.embedder.embed_boxed(query).await?;

        let dense_future = self
            .dense_store
            .dense_search(&query_vec, config.candidates_per_source, filter, 0.0);
        let sparse_future = async { self.bm25.search(query, config.candidates_per_source) };

        let (dense_hits, sparse_hits) = tokio::join!(dense_future, sparse_future);
        let dense_hits = dense_hits?;
        let sparse_hits = sparse_hits?;

        let dense_ranked: Vec<RankedHit> = dense_hits
            .into_iter()
            .map(|hit| RankedHit {
                policy_id: hit.policy_id,
                score: hit.score,
                matched_excerpt: hit.matched_excerpt,
            })
            .collect();

        let sparse_ranked = self.aggregate_sparse_to_policy(sparse_hits, config.sparse_min_score);

        let fused = match config.fusion_mode {
            // RRF's raw `sum(1/(k+rank))` tops out well under 1.0 (~0.033
            // for a doc ranked first in both sources at k=60), so it has to
            // be rescaled into the same [0, 1] range the dynamic threshold
            // is expressed in, the same way `fuse_weighted` already does.
            FusionMode::Rrf => {
                normalize_search_hits(fuse_rrf(&dense_ranked, &sparse_ranked, config.rrf_k as f64))
            }
            FusionMode::Weighted => fuse_weighted(
                &dense_ranked,
                &sparse_ranked,
                config.dense_weight,
                config.sparse_weight,
            ),
        };

        let mut hits: Vec<SearchHit> = fused
            .into_iter()
            .filter(|hit| hit.score >= threshold)
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(config.final_limit);
        Ok(hits)
    }

    fn aggregate_sparse_to_policy(
        &self,
        sparse_hits: Vec<(i64, f64)>,
        min_score: f64,
    ) -> Vec<RankedHit> {
        let mut seen_policies = std::collections::HashSet::new();
        let mut ranked = Vec::new();

        for (chunk_id, score) in sparse_hits {
            if score < min_score {
                continue;
            }
            let Some(chunk) = self.chunk_lookup.get(&chunk_id) else {
                continue;
            };
            // sparse_hits is already sorted descending by score, so the
            // first occurrence of a policy id is its best-scoring chunk.
            if !seen_policies.insert(chunk.policy_id) {
                continue;
            }
            ranked.push(RankedHit {
                policy_id: chunk.policy_id,
                score,
                matched_excerpt: chunk.content.clone(),
            });
        }

        ranked
    }
}

struct FusedEntry {
    score: f64,
    match_type: MatchType,
    matched_excerpt: String,
}

fn fuse_rrf(dense: &[RankedHit], sparse: &[RankedHit], k: f64) -> Vec<SearchHit> {
    let mut fused: HashMap<PolicyId, FusedEntry> = HashMap::new();

    for (rank, hit) in dense.iter().enumerate() {
        let contribution = 1.0 / (k + (rank + 1) as f64);
        fused
            .entry(hit.policy_id)
            .and_modify(|e| e.score += contribution)
            .or_insert(FusedEntry {
                score: contribution,
                match_type: MatchType::Dense,
                matched_excerpt: hit.matched_excerpt.clone(),
            });
    }

    for (rank, hit) in sparse.iter().enumerate() {
        let contribution = 1.0 / (k + (rank + 1) as f64);
        fused
            .entry(hit.policy_id)
            .and_modify(|e| {
                e.score += contribution;
                e.match_type = MatchType::Hybrid;
            })
            .or_insert(FusedEntry {
                score: contribution,
                match_type: MatchType::Sparse,
                matched_excerpt: hit.matched_excerpt.clone(),
            });
    }

    fused
        .into_iter()
        .map(|(policy_id, entry)| SearchHit {
            policy_id,
            score: entry.score,
            match_type: entry.match_type,
            matched_excerpt: entry.matched_excerpt,
        })
        .collect()
}

/// Min-max normalize a batch of fused hits to `[0, 1]`, preserving
/// `match_type` and excerpt. A single-hit (or all-equal-score) batch
/// normalizes to `1.0`, matching `normalize`'s convention below.
fn normalize_search_hits(hits: Vec<SearchHit>) -> Vec<SearchHit> {
    if hits.is_empty() {
        return hits;
    }
    let min = hits.iter().map(|h| h.score).fold(f64::INFINITY, f64::min);
    let max = hits.iter().map(|h| h.score).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    hits.into_iter()
        .map(|mut h| {
            h.score = if range > 0.0 { (h.score - min) / range } else { 1.0 };
            h
        })
        .collect()
}

fn normalize(values: &[(PolicyId, f64, String)]) -> HashMap<PolicyId, f64> {
    if values.is_empty() {
        return HashMap::new();
    }
    let min = values.iter().map(|(_, s, _)| *s).fold(f64::INFINITY, f64::min);
    let max = values
        .iter()
        .map(|(_, s, _)| *s)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|(policy_id, score, _)| {
            let normed = if range > 0.0 { (score - min) / range } else { 1.0 };
            (*policy_id, normed)
        })
        .collect()
}

fn fuse_weighted(
    dense: &[RankedHit],
    sparse: &[RankedHit],
    dense_weight: f64,
    sparse_weight: f64,
) -> Vec<SearchHit> {
    let dense_values: Vec<(PolicyId, f64, String)> = dense
        .iter()
        .map(|h| (h.policy_id, h.score, h.matched_excerpt.clone()))
        .collect();
    let sparse_values: Vec<(PolicyId, f64, String)> = sparse
        .iter()
        .map(|h| (h.policy_id, h.score, h.matched_excerpt.clone()))
        .collect();

    let dense_norm = normalize(&dense_values);
    let sparse_norm = normalize(&sparse_values);

    let mut excerpts: HashMap<PolicyId, String> = HashMap::new();
    for hit in dense {
        excerpts.entry(hit.policy_id).or_insert_with(|| hit.matched_excerpt.clone());
    }
    for hit in sparse {
        excerpts.entry(hit.policy_id).or_insert_with(|| hit.matched_excerpt.clone());
    }

    let mut policy_ids: std::collections::HashSet<PolicyId> = std::collections::HashSet::new();
    policy_ids.extend(dense_norm.keys().copied());
    policy_ids.extend(sparse_norm.keys().copied());

    policy_ids
        .into_iter()
        .map(|policy_id| {
            let d = dense_norm.get(&policy_id).copied();
            let s = sparse_norm.get(&policy_id).copied();
            let score = d.unwrap_or(0.0) * dense_weight + s.unwrap_or(0.0) * sparse_weight;
            let match_type = match (d.is_some(), s.is_some()) {
                (true, true) => MatchType::Hybrid,
                (true, false) => MatchType::Dense,
                (false, true) => MatchType::Sparse,
                (false, false) => MatchType::Hybrid,
            };
            SearchHit {
                policy_id,
                score,
                match_type,
                matched_excerpt: excerpts.get(&policy_id).cloned().unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingService, MockEmbedding};
    use crate::index::InMemoryVectorStore;

    fn chunk(chunk_id: i64, policy_id: PolicyId, content: &str) -> DocumentChunk {
        DocumentChunk {
            chunk_id,
            policy_id,
            chunk_index: 0,
            content: content.to_string(),
            doc_type: "support".to_string(),
            embedding: None,
        }
    }

    async fn build_searcher(chunks: Vec<DocumentChunk>) -> HybridSearcher {
        let embedder = MockEmbedding::new();
        let dense_store = Arc::new(InMemoryVectorStore::new());
        for c in &chunks {
            let vec = embedder.embed(&c.content).await.unwrap();
            dense_store.insert(c.clone(), vec).unwrap();
        }
        let bm25 = Arc::new(Bm25Index::new());
        bm25.warm_up(&chunks).await.unwrap();

        HybridSearcher::new(Box::new(embedder), dense_store, bm25, &chunks)
    }

    #[tokio::test]
    async fn test_hybrid_search_returns_hits_matching_both_sources() {
        let chunks = vec![
            chunk(1, 100, "서울 창업 지원금 안내"),
            chunk(2, 200, "청년 문화 행사 공지"),
        ];
        let searcher = build_searcher(chunks).await;
        let config = SearchConfig::default();

        let hits = searcher
            .search("서울 창업 지원금 안내", &Filter::new(), &config, 0.0)
            .await
            .unwrap();

        assert!(!hits.is_empty());
        assert_eq!(hits[0].policy_id, 100);
        assert_eq!(hits[0].match_type, MatchType::Hybrid);
    }

    #[tokio::test]
    async fn test_hybrid_search_empty_corpus_returns_empty() {
        let searcher = build_searcher(vec![]).await;
        let config = SearchConfig::default();

        let hits = searcher
            .search("아무 질문", &Filter::new(), &config, 0.0)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_hybrid_search_respects_threshold() {
        let chunks = vec![chunk(1, 100, "서울 창업 지원금 안내")];
        let searcher = build_searcher(chunks).await;
        let config = SearchConfig::default();

        let hits = searcher
            .search("서울 창업 지원금 안내", &Filter::new(), &config, 1000.0)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_fuse_rrf_hybrid_beats_single_source() {
        let dense = vec![RankedHit {
            policy_id: 1,
            score: 0.9,
            matched_excerpt: "d".into(),
        }];
        let sparse = vec![RankedHit {
            policy_id: 1,
            score: 5.0,
            matched_excerpt: "s".into(),
        }];
        let fused = fuse_rrf(&dense, &sparse, 60.0);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].match_type, MatchType::Hybrid);
    }

    #[test]
    fn test_fuse_rrf_dense_only_match_type() {
        let dense = vec![RankedHit {
            policy_id: 1,
            score: 0.9,
            matched_excerpt: "d".into(),
        }];
        let fused = fuse_rrf(&dense, &[], 60.0);
        assert_eq!(fused[0].match_type, MatchType::Dense);
    }

    #[test]
    fn test_fuse_weighted_combines_normalized_scores() {
        let dense = vec![RankedHit {
            policy_id: 1,
            score: 1.0,
            matched_excerpt: "d".into(),
        }];
        let sparse = vec![RankedHit {
            policy_id: 1,
            score: 1.0,
            matched_excerpt: "s".into(),
        }];
        let fused = fuse_weighted(&dense, &sparse, 0.7, 0.3);
        assert_eq!(fused.len(), 1);
        assert!(fused[0].score > 0.0);
    }
}
