//! C8: the stateless policy-discovery pipeline. Unlike C7 it has no
//! session state and never calls an `AnswerGenerator` — it returns ranked
//! policies plus machine-checkable metrics, not a generated answer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use qa_core::config::SearchConfig;
use qa_core::error::QaError;
use qa_core::ports::{Filter, PolicyRepository, WebSearchAdapter};
use qa_core::types::{Evidence, PolicyRecord, SearchMetrics, WebResult};
use qa_vector::HybridSearcher;

/// Everything `SearchWorkflow::run` produces.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub policies: Vec<PolicyRecord>,
    pub metrics: SearchMetrics,
    pub evidence: Vec<Evidence>,
    pub web_sources: Vec<WebResult>,
    /// One-line templated summary, composed without a model (§4.8 step 6).
    pub summary: String,
}

/// C8's discovery pipeline: extract keywords, compute a dynamic
/// threshold, run the hybrid searcher, supplement from the web if the
/// result set looks thin, then summarize.
pub struct SearchWorkflow {
    searcher: Arc<HybridSearcher>,
    policies: Arc<dyn PolicyRepository>,
    web_search: Arc<dyn WebSearchAdapter>,
}

impl SearchWorkflow {
    pub fn new(
        searcher: Arc<HybridSearcher>,
        policies: Arc<dyn PolicyRepository>,
        web_search: Arc<dyn WebSearchAdapter>,
    ) -> Self {
        Self {
            searcher,
            policies,
            web_search,
        }
    }

    pub async fn run(
        &self,
        query: &str,
        filter: &Filter,
        config: &SearchConfig,
    ) -> Result<SearchOutcome, QaError> {
        let started = Instant::now();

        let keywords = config.extract_keywords(query);
        let region = filter.get("region").map(String::as_str);
        let category = filter.get("category").map(String::as_str);

        // Provisional threshold assumes a mid-sized result set; §4.4
        // folds the actual count back in once the first pass runs.
        let provisional_threshold =
            config.dynamic_threshold(&keywords, region, category, config.target_min_results);
        let hits = self
            .searcher
            .search(query, filter, config, provisional_threshold)
            .await?;

        let threshold_used = config.dynamic_threshold(&keywords, region, category, hits.len());

        let top_score = hits.first().map(|h| h.score).unwrap_or(0.0);
        let mut web_search_triggered = false;
        let mut web_sources = Vec::new();

        if hits.len() < config.fallback.fallback_min_results
            || top_score < config.fallback.fallback_min_top_score
        {
            web_search_triggered = true;
            web_sources = self
                .web_search
                .search(query, 5, None)
                .await
                .unwrap_or_default();
        }

        let policy_ids: Vec<_> = hits.iter().map(|h| h.policy_id).collect();
        let policy_lookup = self.policies.lookup_policies(&policy_ids).await?;
        let policies: Vec<PolicyRecord> = policy_ids
            .iter()
            .filter_map(|id| policy_lookup.get(id).cloned())
            .collect();

        let evidence = build_evidence(&hits, &policy_lookup, &web_sources);

        let avg_score = if hits.is_empty() {
            0.0
        } else {
            hits.iter().map(|h| h.score).sum::<f64>() / hits.len() as f64
        };
        let min_score = hits.iter().map(|h| h.score).fold(f64::INFINITY, f64::min);
        let min_score = if min_score.is_finite() { min_score } else { 0.0 };

        let metrics = SearchMetrics {
            total_candidates: hits.len(),
            final_count: policies.len(),
            top_score,
            avg_score,
            min_score,
            threshold_used,
            web_search_triggered,
            web_search_count: web_sources.len(),
            search_time_ms: started.elapsed().as_millis() as u64,
            sufficiency_reason: None,
        };

        let summary = build_summary(query, &policies, top_score);

        Ok(SearchOutcome {
            policies,
            metrics,
            evidence,
            web_sources,
            summary,
        })
    }
}

fn build_evidence(
    hits: &[qa_core::types::SearchHit],
    policy_lookup: &HashMap<qa_core::types::PolicyId, PolicyRecord>,
    web_sources: &[WebResult],
) -> Vec<Evidence> {
    let mut evidence: Vec<Evidence> = hits
        .iter()
        .filter(|h| policy_lookup.contains_key(&h.policy_id))
        .map(|h| Evidence::Internal {
            policy_id: h.policy_id,
            chunk_index: 0,
            doc_type: "support".to_string(),
            content_excerpt: h.matched_excerpt.clone(),
            score: h.score,
            link: "policy_detail".to_string(),
        })
        .collect();

    evidence.extend(web_sources.iter().map(|w| Evidence::Web {
        title: w.title.clone(),
        url: w.url.clone(),
        snippet: w.snippet.clone(),
        fetched_date: w.fetched_date.clone(),
        score: w.score,
        link: "external".to_string(),
    }));

    evidence
}

/// Composes `"<query> search returned <N> results; top match <name>
/// (<score>%)"` without invoking a model, the same way the teacher's
/// digest generator composes a report purely from structured counts.
fn build_summary(query: &str, policies: &[PolicyRecord], top_score: f64) -> String {
    if policies.is_empty() {
        return format!("'{query}' 검색 결과가 없습니다.");
    }

    let top_name = &policies[0].name;
    format!(
        "'{query}' 검색 결과 {}건; 최상위 일치 {} ({:.0}%)",
        policies.len(),
        top_name,
        top_score * 100.0
    )
}
