//! Vector index abstraction and in-memory implementation.
//!
//! A [`VectorIndex`] answers nearest-neighbour queries over stored chunks. It
//! returns each hit with its text and stored embedding so the diversifier can
//! work without a second round trip.

use async_trait::async_trait;
use sift_core::vector::{check_dimensions, cosine_similarity};
use sift_core::{Candidate, Error, IndexKind, RankedList, Result};
use std::sync::RwLock;

use crate::embedding::EmbeddingProvider;

/// Read-only nearest-neighbour search over stored chunk embeddings.
///
/// Implementations return at most `limit` candidates ordered by ascending
/// distance (best first), each carrying its stored embedding. Backend
/// failures should be reported as [`Error::IndexUnavailable`] with
/// [`IndexKind::Vector`].
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return the `limit` nearest chunks to `query_vector`.
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<RankedList>;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}

struct StoredChunk {
    id: String,
    text: String,
    embedding: Vec<f32>,
}

/// In-memory vector index using exhaustive cosine distance.
///
/// Suitable for tests and corpora of a few thousand chunks. Equal distances
/// are ordered by insertion order.
pub struct SimpleVectorIndex {
    dimension: usize,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl SimpleVectorIndex {
    /// Create an empty index for vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// The vector dimension this index accepts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a chunk, replacing any existing chunk with the same id.
    pub fn insert(
        &self,
        id: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Result<()> {
        let id = id.into();
        if embedding.len() != self.dimension {
            return Err(Error::invalid_data(format!(
                "Embedding for '{id}' has {} components, index expects {}",
                embedding.len(),
                self.dimension
            )));
        }

        let mut chunks = self
            .chunks
            .write()
            .map_err(|e| Error::index(IndexKind::Vector, format!("Lock poisoned: {e}")))?;
        let chunk = StoredChunk {
            id,
            text: text.into(),
            embedding,
        };
        match chunks.iter_mut().find(|c| c.id == chunk.id) {
            Some(existing) => *existing = chunk,
            None => chunks.push(chunk),
        }
        Ok(())
    }

    /// Embed `(id, text)` pairs with `provider` and insert them.
    ///
    /// Returns the number of chunks inserted.
    pub async fn index_texts(
        &self,
        provider: &dyn EmbeddingProvider,
        items: &[(String, String)],
    ) -> Result<usize> {
        let texts: Vec<&str> = items.iter().map(|(_, text)| text.as_str()).collect();
        let embeddings = provider.embed_batch(&texts).await?;
        if embeddings.len() != items.len() {
            return Err(Error::embedding(format!(
                "Provider '{}' returned {} embeddings for {} texts",
                provider.name(),
                embeddings.len(),
                items.len()
            )));
        }

        for ((id, text), embedding) in items.iter().zip(embeddings) {
            self.insert(id.clone(), text.clone(), embedding)?;
        }
        log::debug!("Indexed {} chunks with {}", items.len(), provider.name());
        Ok(items.len())
    }
}

#[async_trait]
impl VectorIndex for SimpleVectorIndex {
    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<RankedList> {
        let chunks = self
            .chunks
            .read()
            .map_err(|e| Error::index(IndexKind::Vector, format!("Lock poisoned: {e}")))?;
        if limit == 0 || chunks.is_empty() {
            return Ok(RankedList::new());
        }
        check_dimensions(query_vector, &chunks[0].embedding)?;

        let mut scored = Vec::with_capacity(chunks.len());
        for (idx, chunk) in chunks.iter().enumerate() {
            scored.push((idx, cosine_similarity(query_vector, &chunk.embedding)?));
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(idx, similarity)| {
                let chunk = &chunks[idx];
                Candidate::new(chunk.id.clone(), chunk.text.clone())
                    .with_embedding(chunk.embedding.clone())
                    .with_score(similarity)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "simple"
    }
}

impl std::fmt::Debug for SimpleVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleVectorIndex")
            .field("dimension", &self.dimension)
            .field("chunks", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingProvider;

    fn index_with(vectors: &[(&str, Vec<f32>)]) -> SimpleVectorIndex {
        let index = SimpleVectorIndex::new(vectors[0].1.len());
        for (id, v) in vectors {
            index.insert(*id, format!("text {id}"), v.clone()).unwrap();
        }
        index
    }

    #[tokio::test]
    async fn test_search_orders_by_ascending_distance() {
        let index = index_with(&[
            ("far", vec![0.0, 1.0]),
            ("near", vec![1.0, 0.1]),
            ("mid", vec![1.0, 1.0]),
        ]);
        let results = index.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.ids(), vec!["near", "mid", "far"]);
        assert!(results.iter().all(|c| c.embedding.is_some()));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let index = index_with(&[("a", vec![1.0, 0.0]), ("b", vec![0.5, 0.5]), ("c", vec![0.0, 1.0])]);
        assert_eq!(index.search(&[1.0, 0.0], 2).await.unwrap().len(), 2);
        assert!(index.search(&[1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let index = index_with(&[("first", vec![1.0, 0.0]), ("second", vec![2.0, 0.0])]);
        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.ids(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index = SimpleVectorIndex::new(3);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let index = index_with(&[("a", vec![1.0, 0.0])]);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).await.is_err());
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let index = SimpleVectorIndex::new(2);
        let err = index.insert("a", "text", vec![1.0]).unwrap_err();
        assert!(err.to_string().contains("index expects 2"));
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let index = SimpleVectorIndex::new(2);
        index.insert("a", "old", vec![1.0, 0.0]).unwrap();
        index.insert("a", "new", vec![0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_index_texts_with_provider() {
        let provider = HashingEmbeddingProvider::new(64);
        let index = SimpleVectorIndex::new(64);
        let items = vec![
            ("a".to_string(), "cadence resolution".to_string()),
            ("b".to_string(), "bread baking".to_string()),
        ];
        assert_eq!(index.index_texts(&provider, &items).await.unwrap(), 2);

        let query = provider.embed("cadence").await.unwrap();
        let results = index.search(&query, 1).await.unwrap();
        assert_eq!(results.ids(), vec!["a"]);
    }
}
