//! Route handler functions for §6's four domain endpoints plus the
//! ambient `/healthz`/`/readyz` probes.

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use qa_core::ports::Filter;
use qa_core::types::{Evidence, PolicyContext, PolicyId, PolicyRecord, SearchMetrics, WebResult};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// POST /chat/init-policy
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InitPolicyRequest {
    pub session_id: String,
    pub policy_id: PolicyId,
}

#[derive(Debug, Serialize)]
pub struct InitPolicyResponse {
    pub session_id: String,
    pub policy_id: PolicyId,
    pub status: String,
    pub documents_count: usize,
}

/// Populates the session's `PolicyContext` cache via a single metadata
/// lookup and a single vector-store scroll (§4.1, §4.5).
pub async fn init_policy(
    State(state): State<AppState>,
    Json(req): Json<InitPolicyRequest>,
) -> Result<Json<InitPolicyResponse>, ApiError> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError::Validation("session_id must not be empty".into()));
    }

    let policy = state
        .policies
        .get_policy(req.policy_id)
        .await
        .map_err(ApiError::from)?
        .ok_or(ApiError::NotFoundPolicy(req.policy_id))?;

    let mut filter: Filter = HashMap::new();
    filter.insert("policy_id".to_string(), req.policy_id.to_string());
    let max_chunks = state.config.caches.max_chunks_per_policy;
    let chunks = state
        .dense_store
        .scroll(&filter, max_chunks)
        .await
        .map_err(ApiError::from)?;

    let documents_count = chunks.len();
    let context = PolicyContext {
        policy_id: req.policy_id,
        policy,
        chunks,
        cached_at: Utc::now(),
    };
    state.policy_cache.set(&req.session_id, context);

    Ok(Json(InitPolicyResponse {
        session_id: req.session_id,
        policy_id: req.policy_id,
        status: "ready".to_string(),
        documents_count,
    }))
}

// =============================================================================
// POST /chat
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    #[serde(default)]
    pub policy_id: Option<PolicyId>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub answer: String,
    pub evidence: Vec<Evidence>,
    pub web_sources: Vec<WebResult>,
}

/// Runs C7's QA workflow for one turn. `policy_id` is accepted for
/// parity with §6's request body but is advisory only — the workflow
/// reads whatever `PolicyContext` init-policy already cached for this
/// session.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let turn = state
        .qa_workflow
        .run(&req.session_id, &req.message)
        .await
        .map_err(ApiError::from)?;

    let web_sources: Vec<WebResult> = turn
        .evidence
        .iter()
        .filter_map(|e| match e {
            Evidence::Web {
                title,
                url,
                snippet,
                fetched_date,
                score,
                ..
            } => Some(WebResult {
                title: title.clone(),
                url: url.clone(),
                snippet: snippet.clone(),
                fetched_date: fetched_date.clone(),
                score: *score,
            }),
            Evidence::Internal { .. } => None,
        })
        .collect();

    Ok(Json(ChatResponse {
        session_id: req.session_id,
        answer: turn.content,
        evidence: turn.evidence,
        web_sources,
    }))
}

// =============================================================================
// POST /chat/cleanup
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CleanupRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub status: String,
}

/// Idempotent: clearing an already-clear session still returns `cleared`.
pub async fn cleanup(
    State(state): State<AppState>,
    Json(req): Json<CleanupRequest>,
) -> Json<CleanupResponse> {
    state.chat_cache.clear(&req.session_id);
    state.policy_cache.clear(&req.session_id);
    Json(CleanupResponse {
        status: "cleared".to_string(),
    })
}

// =============================================================================
// GET /policies/search
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub region: Option<String>,
    pub category: Option<String>,
    pub target_group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub policies: Vec<PolicyRecord>,
    pub metrics: SearchMetrics,
    pub evidence: Vec<Evidence>,
    pub web_sources: Vec<WebResult>,
    pub summary: String,
}

/// Runs C8's stateless policy-discovery pipeline.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    if params.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".into()));
    }

    let mut filter: Filter = HashMap::new();
    if let Some(region) = &params.region {
        filter.insert("region".to_string(), region.clone());
    }
    if let Some(category) = &params.category {
        filter.insert("category".to_string(), category.clone());
    }
    if let Some(target_group) = &params.target_group {
        filter.insert("target_group".to_string(), target_group.clone());
    }

    let outcome = state
        .search_workflow
        .run(&params.query, &filter, &state.config.retrieval)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(SearchResponse {
        policies: outcome.policies,
        metrics: outcome.metrics,
        evidence: outcome.evidence,
        web_sources: outcome.web_sources,
        summary: outcome.summary,
    }))
}

// =============================================================================
// Ambient probes (A4)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// Always 200 once the process is up; checks nothing downstream.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// 200 once the BM25 index has finished its first build (or pre-warm),
/// 503 otherwise (§6).
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.bm25_ready.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
}
