//! Test-only `AppState` builder shared by this crate's unit and
//! integration tests. Wires the same components `qa-app`'s bootstrap
//! does, but entirely in-memory: `Database::in_memory`, a fresh
//! `InMemoryVectorStore`, `MockEmbedding`, and `MockWebSearch`/
//! `TemplateAnswerGenerator` so tests never touch the network.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use qa_chat::{ChatCache, PolicyContextCache, QaWorkflow, TemplateAnswerGenerator};
use qa_core::config::EngineConfig;
use qa_core::types::{DocumentChunk, PolicyId, PolicyRecord};
use qa_search::SearchWorkflow;
use qa_storage::{Database, SqlitePolicyRepository};
use qa_vector::embedding::EmbeddingService;
use qa_vector::{Bm25Index, HybridSearcher, InMemoryVectorStore, MockEmbedding};
use qa_web::MockWebSearch;

use crate::state::AppState;

pub async fn test_state(api_token: &str) -> AppState {
    let (state, _repo) = test_state_with_repo(api_token, &[]).await;
    state
}

/// Builds `AppState` over a corpus of `(PolicyRecord, chunks)` pairs,
/// indexed into both the SQLite repository and the in-memory
/// dense/sparse stores so `/chat/init-policy` and `/policies/search`
/// have something to find.
pub async fn test_state_with_repo(
    api_token: &str,
    corpus: &[(PolicyRecord, Vec<DocumentChunk>)],
) -> (AppState, Arc<SqlitePolicyRepository>) {
    let mut config = EngineConfig::default();
    config.server.api_token = api_token.to_string();

    let db = Arc::new(Database::in_memory().expect("in-memory sqlite"));
    let repo = Arc::new(SqlitePolicyRepository::new(db));

    let embedder = MockEmbedding::new();
    let dense_store = Arc::new(InMemoryVectorStore::new());
    let mut all_chunks: Vec<DocumentChunk> = Vec::new();

    for (policy, chunks) in corpus {
        repo.seed_policy(policy, chunks).expect("seed policy");
        for chunk in chunks {
            let vec = embedder.embed(&chunk.content).await.expect("embed");
            dense_store.insert(chunk.clone(), vec).expect("insert");
        }
        all_chunks.extend(chunks.iter().cloned());
    }

    let bm25 = Arc::new(Bm25Index::new());
    bm25.warm_up(&all_chunks).await.expect("warm up bm25");
    let bm25_ready = Arc::new(AtomicBool::new(true));

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

    let state = AppState::new(
        Arc::new(config),
        repo.clone() as Arc<dyn qa_core::ports::PolicyRepository>,
        dense_store as Arc<dyn qa_core::ports::DenseStore>,
        chat_cache,
        policy_cache,
        qa_workflow,
        search_workflow,
        bm25_ready,
    );

    (state, repo)
}

pub fn sample_policy(id: PolicyId, name: &str) -> PolicyRecord {
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

pub fn sample_chunks(policy_id: PolicyId, n: i64) -> Vec<DocumentChunk> {
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
