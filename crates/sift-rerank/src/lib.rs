//! Reranking for Sift.
//!
//! A [`PairScorer`] rates (query, passage) pairs, typically with a
//! cross-encoder. The [`Reranker`] adapter turns those scores into a new
//! order and cuts the list to `k_rerank`. It only reorders and truncates;
//! passage text is never touched.
//!
//! # Features
//!
//! - `rerank-fastembed`: Enable local cross-encoder scoring via fastembed

pub mod reranker;
pub mod scorer;

#[cfg(feature = "rerank-fastembed")]
pub mod fastembed;

pub use reranker::{Reranker, order_by_scores};
pub use scorer::{OverlapScorer, PairScorer};

#[cfg(feature = "rerank-fastembed")]
pub use self::fastembed::FastEmbedScorer;
