//! Policy QA engine binary — composition root.
//!
//! 1. Parse CLI args, load configuration from TOML.
//! 2. Open SQLite (migrations run automatically), build the in-memory
//!    dense vector store, and the BM25 sparse index.
//! 3. Wire the C1-C8 services into one `AppState`.
//! 4. Spawn the session-cache TTL sweep.
//! 5. Start the axum REST API server with graceful shutdown.
//!
//! `seed` is a dev/test subcommand that loads a JSON fixture straight into
//! SQLite without involving the (out-of-scope) real ingestion pipeline.

mod cli;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use qa_api::routes;
use qa_api::state::AppState;
use qa_chat::{ChatCache, PolicyContextCache, QaWorkflow, TemplateAnswerGenerator};
use qa_core::config::EngineConfig;
use qa_core::ports::{DenseStore, PolicyRepository, WebSearchAdapter};
use qa_core::types::{DocumentChunk, PolicyRecord};
use qa_search::SearchWorkflow;
use qa_storage::{Database, SqlitePolicyRepository};
use qa_vector::embedding::{EmbeddingService, MockEmbedding};
use qa_vector::{Bm25Index, HybridSearcher, InMemoryVectorStore};
use qa_web::{HttpWebSearch, MockWebSearch};

use cli::{CliArgs, Command};

#[derive(Debug, serde::Deserialize)]
struct SeedFixture {
    policies: Vec<PolicyRecord>,
    chunks: Vec<DocumentChunk>,
}

/// Load a JSON fixture and insert it directly into the SQLite corpus.
/// Not part of the `PolicyRepository` port — ingestion is out of scope
/// for this engine (§1), this exists purely to make local/dev runs and
/// integration testing self-contained.
fn run_seed(database_path: &std::path::Path, fixture_path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(fixture_path)?;
    let fixture: SeedFixture = serde_json::from_str(&raw)?;

    let db = Database::new(database_path)?;
    let repo = SqlitePolicyRepository::new(Arc::new(db));

    let mut chunks_by_policy: HashMap<i64, Vec<DocumentChunk>> = HashMap::new();
    for chunk in fixture.chunks {
        chunks_by_policy.entry(chunk.policy_id).or_default().push(chunk);
    }

    for policy in &fixture.policies {
        let chunks = chunks_by_policy.remove(&policy.id).unwrap_or_default();
        repo.seed_policy(policy, &chunks)?;
        tracing::info!(policy_id = policy.id, chunks = chunks.len(), "seeded policy");
    }

    tracing::info!(policies = fixture.policies.len(), "seed complete");
    Ok(())
}

/// Build the dense vector store and BM25 index from every chunk the
/// relational store currently holds (C1.scroll -> C2 build, §4.2).
async fn build_retrieval_stack(
    repo: &SqlitePolicyRepository,
    embedder: &MockEmbedding,
) -> Result<(Arc<InMemoryVectorStore>, Arc<Bm25Index>, Vec<DocumentChunk>), Box<dyn std::error::Error>> {
    let chunks = repo.scroll_all_chunks()?;
    tracing::info!(chunks = chunks.len(), "loaded corpus for retrieval stack build");

    let dense_store = Arc::new(InMemoryVectorStore::new());
    for chunk in &chunks {
        let vector = embedder.embed(&chunk.content).await?;
        dense_store.insert(chunk.clone(), vector)?;
    }

    let bm25 = Arc::new(Bm25Index::new());
    Ok((dense_store, bm25, chunks))
}

fn build_web_search(config: &EngineConfig) -> Arc<dyn WebSearchAdapter> {
    if config.web_search.endpoint.is_empty() {
        tracing::warn!("[web_search].endpoint is unset, falling back to MockWebSearch");
        Arc::new(MockWebSearch::new())
    } else {
        Arc::new(HttpWebSearch::new(
            config.web_search.endpoint.clone(),
            config.web_search.api_key.clone(),
            config.timeouts.web_search_timeout_ms,
        ))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_path = args.resolve_config_path();
    let config = EngineConfig::load_or_default(&config_path);

    let log_level = args.resolve_log_level(&config.logging.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting policy QA engine");
    tracing::info!(path = %config_path.display(), "configuration loaded");

    let database_path = args.resolve_database_path(&config.storage.database_path);

    if let Some(Command::Seed { path }) = &args.command {
        run_seed(&database_path, path)?;
        return Ok(());
    }

    // Storage (C1 relational half).
    let db = Arc::new(Database::new(&database_path)?);
    let repo = Arc::new(SqlitePolicyRepository::new(db));

    // Dense + sparse retrieval stack (C1 dense half, C2).
    let embedder = MockEmbedding::new();
    let (dense_store, bm25, chunks) = build_retrieval_stack(&repo, &embedder).await?;

    let bm25_ready = Arc::new(AtomicBool::new(false));
    if config.retrieval.prewarm_bm25 {
        bm25.warm_up(&chunks).await?;
        bm25_ready.store(true, std::sync::atomic::Ordering::Relaxed);
        tracing::info!("BM25 index prewarmed at bootstrap");
    } else {
        let bm25_for_lazy = Arc::clone(&bm25);
        let bm25_ready_for_lazy = Arc::clone(&bm25_ready);
        let chunks_for_lazy = chunks.clone();
        tokio::spawn(async move {
            if bm25_for_lazy.warm_up(&chunks_for_lazy).await.is_ok() {
                bm25_ready_for_lazy.store(true, std::sync::atomic::Ordering::Relaxed);
            }
        });
    }

    // C3: hybrid searcher fusing C1's dense half with C2's BM25 index.
    let searcher = Arc::new(HybridSearcher::new(
        Box::new(embedder),
        dense_store.clone() as Arc<dyn DenseStore>,
        bm25,
        &chunks,
    ));

    // C5: session caches, plus the background TTL sweep.
    let chat_cache = Arc::new(ChatCache::new(
        config.caches.max_history_turns,
        Duration::from_secs(config.caches.cache_ttl_seconds),
    ));
    let policy_cache = Arc::new(PolicyContextCache::new(Duration::from_secs(
        config.caches.cache_ttl_seconds,
    )));
    qa_chat::spawn_sweep_task(
        chat_cache.clone(),
        policy_cache.clone(),
        Duration::from_secs(config.caches.cache_sweep_interval_seconds),
    );

    // C6: web-search adapter.
    let web_search = build_web_search(&config);

    // C7: QA workflow.
    let qa_workflow = Arc::new(QaWorkflow::new(
        chat_cache.clone(),
        policy_cache.clone(),
        web_search.clone(),
        Arc::new(TemplateAnswerGenerator::new()),
    ));

    // C8: stateless discovery search workflow, sharing C3's hybrid searcher.
    let search_workflow = Arc::new(SearchWorkflow::new(
        searcher,
        repo.clone() as Arc<dyn PolicyRepository>,
        web_search,
    ));

    let bind_addr = args.resolve_bind_addr(&config.server.bind_addr);
    let mut config = config;
    config.server.bind_addr = bind_addr;

    let state = AppState::new(
        Arc::new(config.clone()),
        repo as Arc<dyn PolicyRepository>,
        dense_store as Arc<dyn DenseStore>,
        chat_cache,
        policy_cache,
        qa_workflow,
        search_workflow,
        bm25_ready,
    );

    routes::start_server(&config, state).await?;

    Ok(())
}
