//! Full-text lexical retrieval for Sift.
//!
//! This crate provides the [`LexicalIndex`] trait consumed by the retrieval
//! orchestrator, an in-memory BM25 implementation, and a Tantivy backend
//! (feature-gated).
//!
//! # Features
//!
//! - `fts-tantivy`: Enable Tantivy-based full-text search

pub mod backend;

#[cfg(feature = "fts-tantivy")]
pub mod tantivy_search;

pub use backend::{LexicalIndex, SimpleLexicalIndex};

#[cfg(feature = "fts-tantivy")]
pub use tantivy_search::TantivyLexicalIndex;
