//! FastEmbed cross-encoder scorer.
//!
//! Wraps `fastembed::TextRerank`. Like the embedding provider, the model sits
//! behind `Arc<Mutex<>>` and scoring runs on `spawn_blocking`.
//!
//! # Feature Gate
//!
//! This module requires the `rerank-fastembed` feature.

use crate::scorer::PairScorer;
use async_trait::async_trait;
use sift_core::{Error, Result};
use std::sync::{Arc, Mutex};

/// Passages scored per model invocation.
const BATCH_SIZE: usize = 32;

/// Map a model name to a fastembed `RerankerModel` variant.
fn resolve_model(name: &str) -> Result<fastembed::RerankerModel> {
    match name {
        "bge-reranker-base" | "BGERerankerBase" => Ok(fastembed::RerankerModel::BGERerankerBase),
        "jina-reranker-v1-turbo-en" | "JINARerankerV1TurboEn" => {
            Ok(fastembed::RerankerModel::JINARerankerV1TurboEn)
        }
        other => Err(Error::config(format!(
            "Unknown reranker model: '{other}'. Supported: bge-reranker-base, \
             jina-reranker-v1-turbo-en"
        ))),
    }
}

/// Cross-encoder scorer backed by a local fastembed model.
pub struct FastEmbedScorer {
    model: Arc<Mutex<fastembed::TextRerank>>,
    model_name: String,
}

impl FastEmbedScorer {
    /// Load the named reranker, downloading it into `cache_path` if needed.
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let model_enum = resolve_model(model_name)?;

        let mut init = fastembed::RerankInitOptions::new(model_enum);
        if let Some(path) = cache_path {
            init = init.with_cache_dir(std::path::PathBuf::from(path));
        }

        let model = fastembed::TextRerank::try_new(init)
            .map_err(|e| Error::rerank(format!("Failed to load reranker '{model_name}': {e}")))?;

        log::info!("Loaded reranker model {model_name}");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl PairScorer for FastEmbedScorer {
    async fn score_pairs(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.clone();
        let query = query.to_string();
        let docs: Vec<String> = passages.iter().map(|p| p.to_string()).collect();
        let count = docs.len();

        let results = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| Error::rerank(format!("Reranker lock poisoned: {e}")))?;
            let doc_refs: Vec<&String> = docs.iter().collect();
            model
                .rerank(&query, doc_refs, false, Some(BATCH_SIZE))
                .map_err(|e| Error::rerank(format!("Reranking failed: {e}")))
        })
        .await
        .map_err(|e| Error::rerank(format!("Reranking task failed: {e}")))??;

        // Results come back sorted by score; put them back in input order.
        let mut scores = vec![f32::NAN; count];
        for result in results {
            let slot = scores
                .get_mut(result.index)
                .ok_or_else(|| Error::rerank(format!("Result index {} out of range", result.index)))?;
            *slot = result.score;
        }
        if scores.iter().any(|s| s.is_nan()) {
            return Err(Error::rerank("Reranker did not score every passage"));
        }
        Ok(scores)
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedScorer")
            .field("model_name", &self.model_name)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_known() {
        assert!(resolve_model("bge-reranker-base").is_ok());
        assert!(resolve_model("BGERerankerBase").is_ok());
        assert!(resolve_model("jina-reranker-v1-turbo-en").is_ok());
    }

    #[test]
    fn test_resolve_model_unknown() {
        let err = resolve_model("cross-encoder-9000").unwrap_err();
        assert!(err.to_string().contains("Unknown reranker model"));
    }

    #[tokio::test]
    #[ignore] // Downloads a model
    async fn test_cross_encoder_prefers_relevant_passage() {
        let scorer = FastEmbedScorer::new("bge-reranker-base", None).unwrap();
        let scores = scorer
            .score_pairs(
                "What resolves a dominant chord?",
                &[
                    "Sourdough needs a long fermentation.",
                    "A dominant chord usually resolves to the tonic.",
                ],
            )
            .await
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0]);
    }
}
