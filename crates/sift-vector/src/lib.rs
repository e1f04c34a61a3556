//! Dense retrieval for Sift.
//!
//! This crate provides the semantic half of the retrieval core: pluggable
//! embedding providers, a vector index abstraction with an in-memory
//! implementation, and Maximal Marginal Relevance (MMR) diversification.
//!
//! # Features
//!
//! - `vector-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       sift-vector                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── HashingEmbeddingProvider (always available)            │
//! │  └── FastEmbedProvider (feature: vector-fastembed)          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  VectorIndex trait                                          │
//! │  └── SimpleVectorIndex (in-memory, cosine distance)         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MMR diversification (normalize once, greedy selection)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_vector::{mmr, EmbeddingProvider, HashingEmbeddingProvider, SimpleVectorIndex, VectorIndex};
//!
//! let provider = HashingEmbeddingProvider::new(384);
//! let index = SimpleVectorIndex::new(384);
//! index.insert("doc-1", "tonic and dominant", provider.embed("tonic and dominant").await?)?;
//!
//! let query = provider.embed("dominant chords").await?;
//! let pool = index.search(&query, 15).await?;
//! let picked = mmr::select(&query, pool, 10, 0.5)?;
//! ```

pub mod embedding;
pub mod index;
pub mod mmr;

// Feature-gated backend modules
#[cfg(feature = "vector-fastembed")]
pub mod fastembed;

// Re-exports: traits
pub use embedding::{EmbeddingProvider, HashingEmbeddingProvider};
pub use index::{SimpleVectorIndex, VectorIndex};

// Feature-gated re-exports
#[cfg(feature = "vector-fastembed")]
pub use self::fastembed::FastEmbedProvider;
