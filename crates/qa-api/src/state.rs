//! Application state shared across all route handlers.
//!
//! `AppState` holds references to every service a handler may need.
//! Cheap to clone: every field is an `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use qa_chat::{ChatCache, PolicyContextCache, QaWorkflow};
use qa_core::config::EngineConfig;
use qa_core::ports::{DenseStore, PolicyRepository};
use qa_search::SearchWorkflow;

/// Shared application state, injected into every handler via axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EngineConfig>,
    pub policies: Arc<dyn PolicyRepository>,
    /// C1's dense half, used directly by `init-policy`'s scroll (§4.1/§4.5)
    /// rather than through the hybrid searcher, which only ever queries it.
    pub dense_store: Arc<dyn DenseStore>,
    pub chat_cache: Arc<ChatCache>,
    pub policy_cache: Arc<PolicyContextCache>,
    pub qa_workflow: Arc<QaWorkflow>,
    pub search_workflow: Arc<SearchWorkflow>,
    /// Flips to `true` once the BM25 index has completed its first build,
    /// used by `/readyz` (§6).
    pub bm25_ready: Arc<AtomicBool>,
    pub start_time: Instant,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<EngineConfig>,
        policies: Arc<dyn PolicyRepository>,
        dense_store: Arc<dyn DenseStore>,
        chat_cache: Arc<ChatCache>,
        policy_cache: Arc<PolicyContextCache>,
        qa_workflow: Arc<QaWorkflow>,
        search_workflow: Arc<SearchWorkflow>,
        bm25_ready: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            policies,
            dense_store,
            chat_cache,
            policy_cache,
            qa_workflow,
            search_workflow,
            bm25_ready,
            start_time: Instant::now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.bm25_ready.load(Ordering::Relaxed)
    }
}
