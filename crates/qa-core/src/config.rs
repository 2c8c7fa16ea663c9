use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QaError, Result};

/// Top-level configuration for the QA engine.
///
/// Loaded from a TOML file at process start (path via `--config` or
/// `QA_CONFIG`, default `config.toml`). Each section corresponds to one of
/// §6's config groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub retrieval: SearchConfig,
    #[serde(default)]
    pub caches: CacheConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| QaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Fusion strategy used by the hybrid searcher (C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    Rrf,
    Weighted,
}

impl Default for FusionMode {
    fn default() -> Self {
        FusionMode::Rrf
    }
}

/// Retrieval tuning: thresholds, candidate/result limits, fusion
/// parameters, per-keyword threshold deltas (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub threshold_default: f64,
    pub threshold_min: f64,
    pub threshold_max: f64,
    pub candidates_per_source: usize,
    pub final_limit: usize,
    pub target_min_results: usize,
    pub target_max_results: usize,
    pub fusion_mode: FusionMode,
    pub dense_weight: f64,
    pub sparse_weight: f64,
    pub rrf_k: u32,
    pub sparse_min_score: f64,
    /// Token -> threshold delta, applied in `classify`'s dynamic-threshold
    /// computation. Shares its keys with the tokenizer's keyword
    /// duplication boost list (§4.2).
    pub keyword_adjustments: HashMap<String, f64>,
    /// Build the BM25 index at process bootstrap instead of waiting for
    /// the first search (§9 open question on first-query latency).
    pub prewarm_bm25: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut keyword_adjustments = HashMap::new();
        keyword_adjustments.insert("지원금".to_string(), -0.05);
        keyword_adjustments.insert("창업".to_string(), -0.05);
        keyword_adjustments.insert("R&D".to_string(), 0.05);

        Self {
            threshold_default: 0.25,
            threshold_min: 0.15,
            threshold_max: 0.50,
            candidates_per_source: 100,
            final_limit: 50,
            target_min_results: 3,
            target_max_results: 15,
            fusion_mode: FusionMode::Rrf,
            dense_weight: 0.7,
            sparse_weight: 0.3,
            rrf_k: 60,
            sparse_min_score: 0.1,
            keyword_adjustments,
            prewarm_bm25: true,
        }
    }
}

impl SearchConfig {
    /// Compute the dynamic similarity threshold per §4.4, applied after
    /// fusion to filter the ranked hit list.
    pub fn dynamic_threshold(
        &self,
        keywords: &[String],
        region: Option<&str>,
        category: Option<&str>,
        provisional_count: usize,
    ) -> f64 {
        let mut t = self.threshold_default;

        for k in keywords {
            if let Some(delta) = self.keyword_adjustments.get(k) {
                t += delta;
            }
        }
        if region.is_some() {
            t -= 0.02;
        }
        if category.is_some() {
            t -= 0.02;
        }
        if provisional_count < self.target_min_results {
            t -= 0.05;
        } else if provisional_count > self.target_max_results {
            t += 0.03;
        }

        t.clamp(self.threshold_min, self.threshold_max)
    }

    /// Keywords from `keyword_adjustments` found in `query` (§4.2/§4.4),
    /// shared by C7's classify node and C8's search workflow. `"R&D"` is
    /// matched case-insensitively since the sparse tokenizer's
    /// punctuation split would otherwise break it into "r"/"d" before a
    /// literal-substring check could see it.
    pub fn extract_keywords(&self, query: &str) -> Vec<String> {
        let lowered = query.to_lowercase();
        let mut found: Vec<String> = self
            .keyword_adjustments
            .keys()
            .filter(|k| k.as_str() != "R&D")
            .filter(|k| query.contains(k.as_str()))
            .cloned()
            .collect();

        if self.keyword_adjustments.contains_key("R&D") && lowered.contains("r&d") {
            found.push("R&D".to_string());
        }

        found
    }
}

/// Session cache sizing and eviction (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// §9 resolution: "25 turns = 50 messages" — stored as the message
    /// (ChatTurn) cap, i.e. `2 * max_history_turns`.
    pub max_history_turns: usize,
    pub cache_ttl_seconds: u64,
    pub cache_sweep_interval_seconds: u64,
    /// Hard cap on chunks cached per `PolicyContext`.
    pub max_chunks_per_policy: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 25,
            cache_ttl_seconds: 24 * 60 * 60,
            cache_sweep_interval_seconds: 5 * 60,
            max_chunks_per_policy: 500,
        }
    }
}

/// Per-call deadlines for every suspension point (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub llm_timeout_ms: u64,
    pub web_search_timeout_ms: u64,
    pub vector_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_timeout_ms: 120_000,
            web_search_timeout_ms: 10_000,
            vector_timeout_ms: 5_000,
        }
    }
}

/// Web-search fallback triggers, shared by C7's sufficiency check and
/// C8's search workflow (§4.4/§4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub fallback_min_results: usize,
    pub fallback_min_top_score: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            fallback_min_results: 2,
            fallback_min_top_score: 0.35,
        }
    }
}

/// Ambient HTTP surface configuration (A4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_ms: u64,
    pub cors_allowed_origins: Vec<String>,
    pub enable_compression: bool,
    /// Empty disables bearer-token auth.
    pub api_token: String,
    pub rate_limit_per_second: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            request_timeout_ms: 30_000,
            cors_allowed_origins: vec!["*".to_string()],
            enable_compression: true,
            api_token: String::new(),
            rate_limit_per_second: 20,
        }
    }
}

/// Ambient storage configuration (A4/C1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
    pub vector_dim: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "data/qa-engine.db".to_string(),
            vector_dim: 384,
        }
    }
}

/// Ambient logging configuration (A3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// C6 web-search adapter configuration. An empty `endpoint` means no
/// real provider is configured; `qa-app` falls back to `MockWebSearch`
/// rather than wiring `HttpWebSearch` against nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub endpoint: String,
    pub api_key: String,
    pub max_results: usize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            max_results: 5,
        }
    }
}
