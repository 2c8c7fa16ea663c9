//! Integration tests for the policy QA/search HTTP API, exercised
//! end-to-end through the axum router via `tower::ServiceExt::oneshot`
//! (no real socket).

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use qa_api::{create_router, AppState};
use qa_chat::{ChatCache, PolicyContextCache, QaWorkflow, TemplateAnswerGenerator};
use qa_core::config::EngineConfig;
use qa_core::types::{DocumentChunk, PolicyId, PolicyRecord};
use qa_search::SearchWorkflow;
use qa_storage::{Database, SqlitePolicyRepository};
use qa_vector::embedding::EmbeddingService;
use qa_vector::{Bm25Index, HybridSearcher, InMemoryVectorStore, MockEmbedding};
use qa_web::MockWebSearch;

const TEST_TOKEN: &str = "test-token-12345";

fn sample_policy(id: PolicyId, name: &str) -> PolicyRecord {
    PolicyRecord {
        id,
        name: name.to_string(),
        region: Some("서울".into()),
        category: Some("창업".into()),
        overview: "overview".into(),
        apply_target: "만 39세 이하".into(),
        support_description: "지원 금액은 최대 8억원".into(),
        url: Some("https://example.gov".into()),
        extras: std::collections::HashMap::new(),
    }
}

fn sample_chunks(policy_id: PolicyId, n: i64) -> Vec<DocumentChunk> {
    (1..=n)
        .map(|i| DocumentChunk {
            chunk_id: policy_id * 1000 + i,
            policy_id,
            chunk_index: i as u32,
            content: format!("{policy_id}번 정책 지원 내용 {i}: 지원 금액은 최대 8억원"),
            doc_type: "support".into(),
            embedding: None,
        })
        .collect()
}

/// Build a fresh, fully-wired `AppState` over an in-memory SQLite
/// database and dense/sparse indexes, seeded with `corpus`.
async fn make_state(api_token: &str, corpus: &[(PolicyRecord, Vec<DocumentChunk>)]) -> AppState {
    let mut config = EngineConfig::default();
    config.server.api_token = api_token.to_string();

    let db = Arc::new(Database::in_memory().unwrap());
    let repo = Arc::new(SqlitePolicyRepository::new(db));

    let embedder = MockEmbedding::new();
    let dense_store = Arc::new(InMemoryVectorStore::new());
    let mut all_chunks: Vec<DocumentChunk> = Vec::new();

    for (policy, chunks) in corpus {
        repo.seed_policy(policy, chunks).unwrap();
        for chunk in chunks {
            let vec = embedder.embed(&chunk.content).await.unwrap();
            dense_store.insert(chunk.clone(), vec).unwrap();
        }
        all_chunks.extend(chunks.iter().cloned());
    }

    let bm25 = Arc::new(Bm25Index::new());
    bm25.warm_up(&all_chunks).await.unwrap();

    let searcher = Arc::new(HybridSearcher::new(
        Box::new(embedder),
        dense_store.clone(),
        bm25,
        &all_chunks,
    ));

    let chat_cache = Arc::new(ChatCache::new(
        config.caches.max_history_turns,
        Duration::from_secs(config.caches.cache_ttl_seconds),
    ));
    let policy_cache = Arc::new(PolicyContextCache::new(Duration::from_secs(
        config.caches.cache_ttl_seconds,
    )));

    let qa_workflow = Arc::new(QaWorkflow::new(
        chat_cache.clone(),
        policy_cache.clone(),
        Arc::new(MockWebSearch::new()),
        Arc::new(TemplateAnswerGenerator::new()),
    ));

    let search_workflow = Arc::new(SearchWorkflow::new(
        searcher,
        repo.clone() as Arc<dyn qa_core::ports::PolicyRepository>,
        Arc::new(MockWebSearch::new()),
    ));

    AppState::new(
        Arc::new(config),
        repo as Arc<dyn qa_core::ports::PolicyRepository>,
        dense_store as Arc<dyn qa_core::ports::DenseStore>,
        chat_cache,
        policy_cache,
        qa_workflow,
        search_workflow,
        Arc::new(AtomicBool::new(true)),
    )
}

fn authed_json(method: &str, uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Ambient probes — exempt from auth
// =============================================================================

#[tokio::test]
async fn test_healthz_no_auth_required() {
    let state = make_state("", &[]).await;
    let app = create_router(state);
    let resp = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_no_auth_required() {
    let state = make_state("", &[]).await;
    let app = create_router(state);
    let resp = app
        .oneshot(Request::get("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_protected_endpoint_rejects_missing_token() {
    let state = make_state(TEST_TOKEN, &[]).await;
    let app = create_router(state);
    let resp = app
        .oneshot(
            Request::get("/policies/search?query=창업")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_endpoint_accepts_correct_token() {
    let policy = sample_policy(507, "서울 청년 창업 지원 사업");
    let chunks = sample_chunks(507, 3);
    let state = make_state(TEST_TOKEN, &[(policy, chunks)]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(
            Request::get("/policies/search?query=창업")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// =============================================================================
// /chat/init-policy, /chat, /chat/cleanup — full session lifecycle
// =============================================================================

#[tokio::test]
async fn test_chat_requires_init_policy_first() {
    let state = make_state("", &[]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(authed_json(
            "POST",
            "/chat",
            serde_json::json!({"session_id": "s1", "message": "안녕하세요"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_init_policy_unknown_id_returns_404() {
    let state = make_state("", &[]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(authed_json(
            "POST",
            "/chat/init-policy",
            serde_json::json!({"session_id": "s1", "policy_id": 999}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let policy = sample_policy(507, "청년 창업 지원 사업");
    let chunks = sample_chunks(507, 5);
    let state = make_state("", &[(policy, chunks)]).await;
    let app = create_router(state);

    let init_resp = app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/chat/init-policy",
            serde_json::json!({"session_id": "s1", "policy_id": 507}),
        ))
        .await
        .unwrap();
    assert_eq!(init_resp.status(), StatusCode::OK);
    let init_body = body_json(init_resp).await;
    assert_eq!(init_body["documents_count"], 5);
    assert_eq!(init_body["status"], "ready");

    let chat_resp = app
        .clone()
        .oneshot(authed_json(
            "POST",
            "/chat",
            serde_json::json!({"session_id": "s1", "message": "지원 금액이 얼마인가요?"}),
        ))
        .await
        .unwrap();
    assert_eq!(chat_resp.status(), StatusCode::OK);
    let chat_body = body_json(chat_resp).await;
    assert!(chat_body["answer"].as_str().unwrap().contains("[정책문서"));
    assert!(chat_body["evidence"].as_array().unwrap().len() > 0);

    let cleanup_resp = app
        .oneshot(authed_json(
            "POST",
            "/chat/cleanup",
            serde_json::json!({"session_id": "s1"}),
        ))
        .await
        .unwrap();
    assert_eq!(cleanup_resp.status(), StatusCode::OK);
    let cleanup_body = body_json(cleanup_resp).await;
    assert_eq!(cleanup_body["status"], "cleared");
}

// =============================================================================
// /policies/search
// =============================================================================

#[tokio::test]
async fn test_search_returns_matching_policy() {
    let policy = sample_policy(507, "서울 청년 창업 지원 사업");
    let chunks = sample_chunks(507, 3);
    let state = make_state("", &[(policy, chunks)]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(
            Request::get("/policies/search?query=창업")
                .header("authorization", format!("Bearer {}", TEST_TOKEN))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["policies"].as_array().unwrap().len() > 0);
    assert!(body["summary"].as_str().unwrap().contains("청년 창업 지원 사업"));
}

#[tokio::test]
async fn test_search_rejects_empty_query() {
    let state = make_state("", &[]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(
            Request::get("/policies/search?query=")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_falls_back_to_web_when_corpus_thin() {
    let state = make_state("", &[]).await;
    let app = create_router(state);

    let resp = app
        .oneshot(
            Request::get("/policies/search?query=완전히%20존재하지%20않는%20정책")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["metrics"]["web_search_triggered"], true);
}
