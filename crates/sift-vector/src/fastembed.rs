//! FastEmbed embedding provider.
//!
//! Wraps `fastembed::TextEmbedding` for local embedding generation with
//! pre-trained models (BGE, MiniLM, multilingual E5).
//!
//! # Thread Safety
//!
//! The model is not `Sync`, so it lives behind `Arc<Mutex<>>` and inference
//! runs on `tokio::task::spawn_blocking`. Construct the provider once at
//! startup and share it by `Arc`; loading a model is expensive.
//!
//! # Feature Gate
//!
//! This module requires the `vector-fastembed` feature.

use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use sift_core::{Error, Result};
use std::sync::{Arc, Mutex};

/// Map a model name to a fastembed `EmbeddingModel` variant.
fn resolve_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name {
        "bge-small-en-v1.5" | "BGESmallENV15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" | "BGEBaseENV15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        "bge-large-en-v1.5" | "BGELargeENV15" => Ok(fastembed::EmbeddingModel::BGELargeENV15),
        "all-minilm-l6-v2" | "AllMiniLML6V2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "multilingual-e5-small" | "MultilingualE5Small" => {
            Ok(fastembed::EmbeddingModel::MultilingualE5Small)
        }
        other => Err(Error::config(format!(
            "Unknown embedding model: '{other}'. Supported: bge-small-en-v1.5, bge-base-en-v1.5, \
             bge-large-en-v1.5, all-minilm-l6-v2, multilingual-e5-small"
        ))),
    }
}

/// FastEmbed-based embedding provider.
///
/// An optional query prefix (for example `"query: "` for E5 models) is
/// prepended to every text passed to [`EmbeddingProvider::embed`]; batch
/// embedding is used for stored passages and is left unprefixed.
pub struct FastEmbedProvider {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    dimension: usize,
    model_name: String,
    query_prefix: Option<String>,
}

impl FastEmbedProvider {
    /// Load the named model, downloading it into `cache_path` if needed.
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let model_enum = resolve_model(model_name)?;

        let mut init = fastembed::InitOptions::new(model_enum);
        if let Some(path) = cache_path {
            init = init.with_cache_dir(std::path::PathBuf::from(path));
        }

        let mut text_embedding = fastembed::TextEmbedding::try_new(init)
            .map_err(|e| Error::embedding(format!("Failed to load model '{model_name}': {e}")))?;

        let probe = text_embedding
            .embed(vec!["dimension probe"], None)
            .map_err(|e| Error::embedding(format!("Failed to probe embedding dimension: {e}")))?;
        let dimension = probe
            .first()
            .map(|v| v.len())
            .ok_or_else(|| Error::embedding("Empty probe embedding"))?;

        log::info!("Loaded embedding model {model_name} ({dimension} dimensions)");

        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            dimension,
            model_name: model_name.to_string(),
            query_prefix: None,
        })
    }

    /// Prepend `prefix` to query texts.
    pub fn with_query_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.query_prefix = Some(prefix.into());
        self
    }

    async fn run(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let model = self.model.clone();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| Error::embedding(format!("Model lock poisoned: {e}")))?;
            model
                .embed(texts, None)
                .map_err(|e| Error::embedding(format!("Embedding failed: {e}")))
        })
        .await
        .map_err(|e| Error::embedding(format!("Embedding task failed: {e}")))?
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = match &self.query_prefix {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };
        self.run(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts.iter().map(|t| t.to_string()).collect()).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .field("query_prefix", &self.query_prefix)
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
        assert!(resolve_model("bge-small-en-v1.5").is_ok());
        assert!(resolve_model("all-minilm-l6-v2").is_ok());
        assert!(resolve_model("multilingual-e5-small").is_ok());
    }

    #[test]
    fn test_resolve_model_aliases() {
        assert!(resolve_model("BGESmallENV15").is_ok());
        assert!(resolve_model("MultilingualE5Small").is_ok());
    }

    #[test]
    fn test_resolve_model_unknown() {
        let err = resolve_model("nonexistent-model").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Unknown embedding model"));
    }

    #[tokio::test]
    #[ignore = "requires model download (~50MB)"]
    async fn test_fastembed_embed_single() {
        let provider = FastEmbedProvider::new("bge-small-en-v1.5", None).unwrap();
        assert_eq!(provider.dimension(), 384);
        let embedding = provider.embed("Hello world").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }

    #[tokio::test]
    #[ignore = "requires model download (~50MB)"]
    async fn test_fastembed_deterministic() {
        let provider = FastEmbedProvider::new("bge-small-en-v1.5", None).unwrap();
        let e1 = provider.embed("same text").await.unwrap();
        let e2 = provider.embed("same text").await.unwrap();
        assert_eq!(e1, e2);
    }
}
