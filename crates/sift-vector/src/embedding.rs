//! Embedding provider trait and hashing implementation.
//!
//! This module defines the `EmbeddingProvider` trait that abstracts over
//! embedding backends. A retrieval call embeds its query exactly once through
//! this trait and reuses the vector for search and diversification.
//!
//! # Providers
//!
//! - `HashingEmbeddingProvider`: Deterministic feature-hashed bag of words
//! - `FastEmbedProvider`: Local transformer models (requires `vector-fastembed`)

use async_trait::async_trait;
use sift_core::Result;
use sift_core::text::terms;

/// Trait for generating text embeddings.
///
/// Implementations are constructed once and shared behind an `Arc`; the
/// `Send + Sync` bound lets concurrent retrieval calls use the same handle.
/// Backends wrapping thread-unsafe libraries synchronize internally.
///
/// Failures should be reported as [`sift_core::Error::EmbeddingFailure`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// Deterministic embedder that hashes lowercase word tokens into buckets.
///
/// Texts sharing words get similar vectors, which makes it usable for tests
/// and offline demos where downloading a model is not an option. Output is
/// unit length unless the text has no tokens, in which case it is all zeros.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    /// Create a hashing provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in terms(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            // High bit picks the sign so collisions partially cancel.
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.hash_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.hash_embedding(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::vector::cosine_similarity;

    #[test]
    fn test_hashing_provider_creation() {
        let provider = HashingEmbeddingProvider::new(384);
        assert_eq!(provider.dimension(), 384);
        assert_eq!(provider.name(), "hashing");
    }

    #[test]
    fn test_zero_dimension_is_clamped() {
        assert_eq!(HashingEmbeddingProvider::new(0).dimension(), 1);
    }

    #[tokio::test]
    async fn test_embed_is_unit_length() {
        let provider = HashingEmbeddingProvider::new(32);
        let embedding = provider.embed("hello world").await.unwrap();
        assert_eq!(embedding.len(), 32);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_embed_deterministic_and_case_insensitive() {
        let provider = HashingEmbeddingProvider::new(64);
        let e1 = provider.embed("Same Text").await.unwrap();
        let e2 = provider.embed("same text").await.unwrap();
        assert_eq!(e1, e2);
    }

    #[tokio::test]
    async fn test_shared_words_are_more_similar() {
        let provider = HashingEmbeddingProvider::new(256);
        let q = provider.embed("dominant seventh chord").await.unwrap();
        let near = provider.embed("the dominant seventh chord resolves").await.unwrap();
        let far = provider.embed("sourdough bread recipe").await.unwrap();
        assert!(cosine_similarity(&q, &near).unwrap() > cosine_similarity(&q, &far).unwrap());
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = HashingEmbeddingProvider::new(4);
        let embedding = provider.embed("  ...  ").await.unwrap();
        assert_eq!(embedding, vec![0.0; 4]);
    }

    #[tokio::test]
    async fn test_embed_batch_matches_single() {
        let provider = HashingEmbeddingProvider::new(16);
        let batch = provider.embed_batch(&["alpha", "beta"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], provider.embed("beta").await.unwrap());
    }

    #[test]
    fn test_trait_object_safety() {
        fn _assert_object_safe(_: &dyn EmbeddingProvider) {}
    }
}
