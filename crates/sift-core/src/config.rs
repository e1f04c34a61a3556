//! Per-call retrieval parameters.
//!
//! A [`RetrievalConfig`] is built by the caller for each `retrieve` call and
//! never mutated by the retrieval pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Default final result size.
pub const DEFAULT_K: usize = 50;

/// Default post-rerank cutoff.
pub const DEFAULT_K_RERANK: usize = 15;

/// Default MMR relevance/diversity trade-off.
pub const DEFAULT_LAMBDA_MULT: f32 = 0.5;

/// Default RRF smoothing constant.
pub const DEFAULT_RRF_K: u32 = 60;

/// Conventional candidate pool multiplier applied to `k`.
pub const FETCH_MULTIPLIER: f64 = 1.5;

// ============================================================================
// RankType
// ============================================================================

/// Retrieval strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankType {
    /// Vector search diversified with MMR.
    #[default]
    Semantic,
    /// Full-text search in index order.
    Lexical,
    /// Semantic and lexical lists merged with RRF.
    Hybrid,
}

impl RankType {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankType::Semantic => "semantic",
            RankType::Lexical => "lexical",
            RankType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for RankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(RankType::Semantic),
            "lexical" => Ok(RankType::Lexical),
            "hybrid" => Ok(RankType::Hybrid),
            other => Err(Error::config(format!(
                "Unknown rank type: '{other}'. Supported: semantic, lexical, hybrid"
            ))),
        }
    }
}

// ============================================================================
// RetrievalConfig
// ============================================================================

/// Immutable parameters for a single retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Final result size (before reranking).
    pub k: usize,

    /// Candidate pool size fetched from the vector index.
    pub k_fetch: usize,

    /// Cutoff applied after reranking.
    pub k_rerank: usize,

    /// MMR trade-off: 1.0 is pure relevance, 0.0 is pure diversity.
    pub lambda_mult: f32,

    /// RRF smoothing constant.
    pub rrf_k: u32,

    /// Retrieval strategy.
    pub rank_type: RankType,

    /// Whether to rerank with the cross-encoder.
    pub use_rerank: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl RetrievalConfig {
    /// Create a config for result size `k` with the conventional pool size
    /// `ceil(1.5 * k)` and default everything else.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            k_fetch: default_fetch(k),
            k_rerank: DEFAULT_K_RERANK,
            lambda_mult: DEFAULT_LAMBDA_MULT,
            rrf_k: DEFAULT_RRF_K,
            rank_type: RankType::default(),
            use_rerank: false,
        }
    }

    /// Override the candidate pool size.
    pub fn with_k_fetch(mut self, k_fetch: usize) -> Self {
        self.k_fetch = k_fetch;
        self
    }

    /// Set the post-rerank cutoff.
    pub fn with_k_rerank(mut self, k_rerank: usize) -> Self {
        self.k_rerank = k_rerank;
        self
    }

    /// Set the MMR trade-off.
    pub fn with_lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.lambda_mult = lambda_mult;
        self
    }

    /// Set the RRF constant.
    pub fn with_rrf_k(mut self, rrf_k: u32) -> Self {
        self.rrf_k = rrf_k;
        self
    }

    /// Set the retrieval strategy.
    pub fn with_rank_type(mut self, rank_type: RankType) -> Self {
        self.rank_type = rank_type;
        self
    }

    /// Enable or disable reranking.
    pub fn with_rerank(mut self, use_rerank: bool) -> Self {
        self.use_rerank = use_rerank;
        self
    }

    /// Upper bound on the number of passages a call can return.
    pub fn result_limit(&self) -> usize {
        if self.use_rerank {
            self.k.min(self.k_rerank)
        } else {
            self.k
        }
    }

    /// Check parameter ranges.
    ///
    /// Undersized pools are not errors; only values that make the algorithms
    /// meaningless are rejected.
    pub fn validate(&self) -> Result<()> {
        if !self.lambda_mult.is_finite() || !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(Error::config(format!(
                "lambda_mult must be within [0, 1], got {}",
                self.lambda_mult
            )));
        }
        Ok(())
    }
}

/// Conventional pool size for a result size of `k`.
pub fn default_fetch(k: usize) -> usize {
    (k as f64 * FETCH_MULTIPLIER).ceil() as usize
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_retriever_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.k, 50);
        assert_eq!(config.k_fetch, 75);
        assert_eq!(config.k_rerank, 15);
        assert_eq!(config.lambda_mult, 0.5);
        assert_eq!(config.rrf_k, 60);
        assert_eq!(config.rank_type, RankType::Semantic);
        assert!(!config.use_rerank);
    }

    #[test]
    fn test_default_fetch_rounds_up() {
        assert_eq!(default_fetch(0), 0);
        assert_eq!(default_fetch(1), 2);
        assert_eq!(default_fetch(3), 5);
        assert_eq!(default_fetch(10), 15);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RetrievalConfig::new(5)
            .with_k_fetch(3)
            .with_k_rerank(2)
            .with_lambda_mult(0.9)
            .with_rrf_k(10)
            .with_rank_type(RankType::Hybrid)
            .with_rerank(true);
        assert_eq!(config.k_fetch, 3);
        assert_eq!(config.k_rerank, 2);
        assert_eq!(config.lambda_mult, 0.9);
        assert_eq!(config.rrf_k, 10);
        assert_eq!(config.rank_type, RankType::Hybrid);
        assert!(config.use_rerank);
        assert_eq!(config.result_limit(), 2);
    }

    #[test]
    fn test_validate_lambda_range() {
        assert!(RetrievalConfig::new(3).with_lambda_mult(0.0).validate().is_ok());
        assert!(RetrievalConfig::new(3).with_lambda_mult(1.0).validate().is_ok());
        assert!(RetrievalConfig::new(3).with_lambda_mult(1.5).validate().is_err());
        assert!(RetrievalConfig::new(3).with_lambda_mult(-0.1).validate().is_err());
        assert!(RetrievalConfig::new(3).with_lambda_mult(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_accepts_undersized_pool() {
        assert!(RetrievalConfig::new(10).with_k_fetch(0).validate().is_ok());
    }

    #[test]
    fn test_rank_type_parse_and_display() {
        assert_eq!("Hybrid".parse::<RankType>().unwrap(), RankType::Hybrid);
        assert_eq!(" lexical ".parse::<RankType>().unwrap(), RankType::Lexical);
        assert_eq!(RankType::Semantic.to_string(), "semantic");
        let err = "fuzzy".parse::<RankType>().unwrap_err();
        assert!(err.to_string().contains("Unknown rank type"));
    }

    #[test]
    fn test_rank_type_serde_lowercase() {
        let json = serde_json::to_string(&RankType::Hybrid).unwrap();
        assert_eq!(json, "\"hybrid\"");
        let parsed: RankType = serde_json::from_str("\"lexical\"").unwrap();
        assert_eq!(parsed, RankType::Lexical);
    }
}
