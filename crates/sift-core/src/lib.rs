//! Sift Core: shared types, errors, timing, and vector math.
//!
//! This crate provides the foundational types used across all Sift crates.
//! It has no internal Sift dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`candidate`]: `Candidate` and `RankedList`
//! - [`config`]: Per-call `RetrievalConfig` and `RankType`
//! - [`text`]: Word tokenization
//! - [`timing`]: Scoped stage measurement
//! - [`vector`]: Dot products, norms, and unit normalization

pub mod candidate;
pub mod config;
pub mod error;
pub mod text;
pub mod timing;
pub mod vector;

// Re-export key types at crate root for convenience
pub use candidate::{Candidate, RankedList};
pub use config::{RankType, RetrievalConfig};
pub use error::{Error, IndexKind, Result};
pub use timing::{StageGuard, StageTiming, StageTimings};
