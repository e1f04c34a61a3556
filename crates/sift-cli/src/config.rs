//! Configuration for the `sift` CLI.
//!
//! Provides the [`SiftConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `SIFT_CONFIG` environment variable
//! 3. XDG default: `~/.config/sift/config.toml`
//! 4. Built-in defaults
//!
//! `SIFT_<SECTION>_<KEY>` environment variables overlay file values. confyg
//! passes env values through as strings, so only string fields can be set
//! this way.

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use sift_core::config::{DEFAULT_K, DEFAULT_K_RERANK, DEFAULT_LAMBDA_MULT, DEFAULT_RRF_K};
use sift_core::{Error, RankType, Result, RetrievalConfig};
use sift_retrieval::FallbackPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Env var naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SIFT_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `sift` CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Corpus location.
    pub corpus: CorpusConfig,

    /// Query and passage embedding.
    pub embedding: EmbeddingConfig,

    /// Full-text index.
    pub lexical: LexicalConfig,

    /// Cross-encoder reranking.
    pub rerank: RerankConfig,

    /// Per-query retrieval parameters.
    pub retrieval: RetrievalSettings,
}

/// Corpus configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Path to a JSONL file of `{"id", "text", "embedding"?}` records.
    pub path: Option<String>,
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding backend: "hashing" or "fastembed".
    pub provider: String,

    /// Model name for the fastembed backend.
    pub model: String,

    /// Vector dimension for the hashing backend.
    pub dimension: usize,

    /// Text prepended to queries (e.g. "query: " for E5 models).
    pub query_prefix: Option<String>,

    /// Model download directory.
    pub cache_path: Option<String>,
}

/// Lexical index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalConfig {
    /// Lexical backend: "simple" or "tantivy".
    pub backend: String,

    /// On-disk index directory for the tantivy backend; in memory if unset.
    pub index_path: Option<String>,
}

/// Reranker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Scorer backend: "overlap" or "fastembed".
    pub scorer: String,

    /// Model name for the fastembed backend.
    pub model: String,

    /// Model download directory.
    pub cache_path: Option<String>,
}

/// Default retrieval parameters, overridable per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of passages to return.
    pub k: usize,

    /// Candidate pool size; derived from `k` when unset.
    pub k_fetch: Option<usize>,

    /// Passages kept after reranking.
    pub k_rerank: usize,

    /// MMR relevance/diversity trade-off.
    pub lambda_mult: f32,

    /// RRF constant.
    pub rrf_k: u32,

    /// Retrieval strategy.
    pub rank_type: RankType,

    /// Rerank results with the configured scorer.
    pub use_rerank: bool,

    /// Behavior when a backend fails.
    pub fallback: FallbackPolicy,

    /// Per-query deadline in milliseconds.
    pub timeout_ms: Option<u64>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hashing".to_string(),
            model: "bge-small-en-v1.5".to_string(),
            dimension: 384,
            query_prefix: None,
            cache_path: None,
        }
    }
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            backend: "simple".to_string(),
            index_path: None,
        }
    }
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            scorer: "overlap".to_string(),
            model: "bge-reranker-base".to_string(),
            cache_path: None,
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            k_fetch: None,
            k_rerank: DEFAULT_K_RERANK,
            lambda_mult: DEFAULT_LAMBDA_MULT,
            rrf_k: DEFAULT_RRF_K,
            rank_type: RankType::default(),
            use_rerank: false,
            fallback: FallbackPolicy::default(),
            timeout_ms: None,
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl RetrievalSettings {
    /// Build a validated per-call config.
    pub fn to_config(&self) -> Result<RetrievalConfig> {
        let mut config = RetrievalConfig::new(self.k)
            .with_k_rerank(self.k_rerank)
            .with_lambda_mult(self.lambda_mult)
            .with_rrf_k(self.rrf_k)
            .with_rank_type(self.rank_type)
            .with_rerank(self.use_rerank);
        if let Some(k_fetch) = self.k_fetch {
            config = config.with_k_fetch(k_fetch);
        }
        config.validate()?;
        Ok(config)
    }

    /// The per-query deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl SiftConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("SIFT");
        env_opts.add_section("corpus");
        env_opts.add_section("embedding");
        env_opts.add_section("lexical");
        env_opts.add_section("rerank");
        env_opts.add_section("retrieval");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        Self::resolve_with(explicit, std::env::var(CONFIG_ENV_VAR).ok())
    }

    fn resolve_with(explicit: Option<&str>, from_env: Option<String>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = from_env {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("sift").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
