use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque session identifier. UUID-shaped but treated as an opaque string
/// by every component — no cross-session visibility is ever assumed.
pub type SessionId = String;

/// Stable integer id of a [`PolicyRecord`].
pub type PolicyId = i64;

// =============================================================================
// Corpus entities (read-only here; populated by out-of-scope ingestion)
// =============================================================================

/// A policy/grant item from the government grant corpus. Immutable after
/// ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: PolicyId,
    pub name: String,
    pub region: Option<String>,
    pub category: Option<String>,
    pub overview: String,
    pub apply_target: String,
    pub support_description: String,
    pub url: Option<String>,
    /// Ingestion-specific overflow (contact, deadline, …) that doesn't
    /// warrant its own typed field.
    #[serde(default)]
    pub extras: HashMap<String, String>,
}

/// A text segment of a [`PolicyRecord`]'s supporting documents — the unit
/// of retrieval. Immutable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: i64,
    pub policy_id: PolicyId,
    /// Ordinal position of this chunk within its owning policy.
    pub chunk_index: u32,
    pub content: String,
    pub doc_type: String,
    /// Dense embedding, populated out-of-band by ingestion. Absent on
    /// chunks returned from `scroll`, which never carries vectors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

// =============================================================================
// Per-session state
// =============================================================================

/// Per-session materialized view over a policy's full document set.
/// Created by init-policy, destroyed by cleanup or TTL expiry. At most one
/// per session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyContext {
    pub policy_id: PolicyId,
    pub policy: PolicyRecord,
    pub chunks: Vec<DocumentChunk>,
    pub cached_at: DateTime<Utc>,
}

impl PolicyContext {
    pub fn documents_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Role of the speaker in a [`ChatTurn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn in a session's conversation. Evidence is populated only on
/// assistant turns and is frozen at answer time — never mutated after
/// construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            evidence: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, evidence: Vec<Evidence>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            evidence,
        }
    }
}

// =============================================================================
// Evidence (tagged union)
// =============================================================================

/// Structured source attribution accompanying an answer. Exactly one of
/// two shapes on the wire, discriminated by `type`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Evidence {
    Internal {
        policy_id: PolicyId,
        chunk_index: u32,
        doc_type: String,
        content_excerpt: String,
        score: f64,
        #[serde(default = "link_policy_detail")]
        link: String,
    },
    Web {
        title: String,
        url: String,
        snippet: String,
        fetched_date: String,
        score: f64,
        #[serde(default = "link_external")]
        link: String,
    },
}

fn link_policy_detail() -> String {
    "policy_detail".to_string()
}

fn link_external() -> String {
    "external".to_string()
}

impl Evidence {
    pub fn is_internal(&self) -> bool {
        matches!(self, Evidence::Internal { .. })
    }

    pub fn is_web(&self) -> bool {
        matches!(self, Evidence::Web { .. })
    }
}

// =============================================================================
// Search result types
// =============================================================================

/// How a [`SearchHit`] was produced by the hybrid searcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Dense,
    Sparse,
    Hybrid,
}

/// One policy-level hit from the hybrid searcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub policy_id: PolicyId,
    /// Min-max normalized to `[0, 1]` by the fuser (both the RRF and
    /// weighted-average paths), so the dynamic similarity threshold is
    /// meaningful regardless of fusion mode.
    pub score: f64,
    pub match_type: MatchType,
    pub matched_excerpt: String,
}

/// Diagnostics attached to a search-workflow response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchMetrics {
    pub total_candidates: usize,
    pub final_count: usize,
    pub top_score: f64,
    pub avg_score: f64,
    pub min_score: f64,
    pub threshold_used: f64,
    pub web_search_triggered: bool,
    pub web_search_count: usize,
    pub search_time_ms: u64,
    pub sufficiency_reason: Option<String>,
}

/// A single result from the web-search adapter (C6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub fetched_date: String,
    pub score: f64,
}

// =============================================================================
// Query classification (C7)
// =============================================================================

/// Route chosen by `classify_query_type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    PolicyQa,
    WebOnly,
}
