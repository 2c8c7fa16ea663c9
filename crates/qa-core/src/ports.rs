//! Trait contracts ("ports" in the spec's vocabulary) over everything this
//! crate treats as an external collaborator: the vector store, the
//! relational metadata store, the web-search provider, and the answer
//! generator (LLM). Concrete adapters live in `qa-storage`, `qa-vector`,
//! `qa-web`, and `qa-chat` respectively; keeping the contracts here lets
//! `qa-chat`/`qa-search` depend on the interface without depending on every
//! adapter crate.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DocumentChunk, PolicyId, PolicyRecord, SearchHit, WebResult};

/// A filter over chunk/policy metadata. Equality-only, matching §4.1's
/// "equality on payload fields" contract.
pub type Filter = HashMap<String, String>;

/// Uniform interface over the vector store (C1, dense half).
#[async_trait]
pub trait DenseStore: Send + Sync {
    /// Ordered, descending-score dense search. Every hit's score is
    /// `>= min_score`; at most `k` hits are returned.
    async fn dense_search(
        &self,
        query_vec: &[f32],
        k: usize,
        filter: &Filter,
        min_score: f64,
    ) -> Result<Vec<SearchHit>>;

    /// Unordered metadata scroll, without vectors. Used to materialize a
    /// `PolicyContext` and to build the BM25 index.
    async fn scroll(&self, filter: &Filter, limit: usize) -> Result<Vec<DocumentChunk>>;
}

/// Uniform interface over the relational metadata store (C1, relational
/// half).
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Returns only the ids that exist; missing ids are silently omitted
    /// rather than erroring, per §7's `Transport{metadata_store}` recovery
    /// policy ("log + omit the missing policy from results").
    async fn lookup_policies(&self, ids: &[PolicyId]) -> Result<HashMap<PolicyId, PolicyRecord>>;

    async fn get_policy(&self, id: PolicyId) -> Result<Option<PolicyRecord>>;
}

/// Thin wrapper over an external web-search provider (C6).
#[async_trait]
pub trait WebSearchAdapter: Send + Sync {
    /// A single call, no internal retries. Callers are responsible for
    /// applying a deadline (see `qa-core::config::TimeoutConfig`).
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        domain_bias: Option<&str>,
    ) -> Result<Vec<WebResult>>;
}

/// Generates natural-language answers under the citation contract (§4.7).
/// The real LLM backend is out of scope; implementations here are either a
/// deterministic template composer (`qa-chat::answer::TemplateAnswerGenerator`,
/// the shipped default) or a stand-in for a real completion API.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// `prompt` already embeds the citation contract and the
    /// history/policy/docs/web context; implementations should not
    /// post-process citation tokens.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
