//! Retrieval orchestration for Sift.
//!
//! This crate composes the backends from `sift-vector`, `sift-fts`, and
//! `sift-rerank` into a single `retrieve(query, config)` call.
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────┐
//!   query ────▶│  Retriever   │
//!              └──────┬───────┘
//!          ┌──────────┴───────────┐
//!          ▼                      ▼
//!   embed + VectorIndex      LexicalIndex
//!          │                      │
//!          ▼                      │
//!     MMR (diversify)             │
//!          └──────────┬───────────┘
//!                     ▼
//!            RRF (hybrid only)
//!                     ▼
//!            Reranker (optional)
//!                     ▼
//!              passage texts
//! ```
//!
//! # Modules
//!
//! - [`fusion`]: Reciprocal Rank Fusion
//! - [`policy`]: Fallback policy for backend failures
//! - [`retriever`]: The `Retriever` orchestrator

pub mod fusion;
pub mod policy;
pub mod retriever;

pub use fusion::reciprocal_rank_fusion;
pub use policy::FallbackPolicy;
pub use retriever::{Retrieval, Retriever};
