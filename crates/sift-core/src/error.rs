//! Error types for Sift operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Sift crates. Uses `thiserror` for derive macros.
//!
//! Failures of external collaborators (embedder, vector index, lexical index,
//! cross-encoder) each have their own variant so callers can decide whether to
//! degrade or give up. An empty result is never an error.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which index backend a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Dense vector similarity index.
    Vector,
    /// Full-text lexical index.
    Lexical,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Vector => f.write_str("vector"),
            IndexKind::Lexical => f.write_str("lexical"),
        }
    }
}

/// Errors that can occur in Sift operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The embedder was unreachable or rejected its input.
    #[error("Embedding failure: {0}")]
    EmbeddingFailure(String),

    /// A vector or lexical backend failed.
    #[error("Index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The backend that failed.
        backend: IndexKind,
        /// Backend-specific detail.
        message: String,
    },

    /// The cross-encoder scorer was unreachable or returned malformed scores.
    #[error("Rerank failure: {0}")]
    RerankFailure(String),

    /// The call did not complete within its deadline.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create an embedding failure.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingFailure(msg.into())
    }

    /// Create an index failure for the given backend.
    pub fn index(backend: IndexKind, msg: impl Into<String>) -> Self {
        Self::IndexUnavailable {
            backend,
            message: msg.into(),
        }
    }

    /// Create a rerank failure.
    pub fn rerank(msg: impl Into<String>) -> Self {
        Self::RerankFailure(msg.into())
    }

    /// True if the error came from an external collaborator rather than
    /// from the caller's input or configuration.
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingFailure(_)
                | Self::IndexUnavailable { .. }
                | Self::RerankFailure(_)
                | Self::Timeout(_)
        )
    }

    /// True if the error is an embedding failure.
    pub fn is_embedding_failure(&self) -> bool {
        matches!(self, Self::EmbeddingFailure(_))
    }

    /// The failing index backend, if this is an index failure.
    pub fn index_kind(&self) -> Option<IndexKind> {
        match self {
            Self::IndexUnavailable { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Sift's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_display_names_backend() {
        let err = Error::index(IndexKind::Lexical, "connection refused");
        assert_eq!(
            err.to_string(),
            "Index unavailable (lexical): connection refused"
        );
        assert_eq!(err.index_kind(), Some(IndexKind::Lexical));
    }

    #[test]
    fn test_dependency_failure_classification() {
        assert!(Error::embedding("down").is_dependency_failure());
        assert!(Error::index(IndexKind::Vector, "down").is_dependency_failure());
        assert!(Error::rerank("down").is_dependency_failure());
        assert!(Error::Timeout(Duration::from_millis(5)).is_dependency_failure());
        assert!(!Error::config("bad k").is_dependency_failure());
        assert!(!Error::invalid_data("nan").is_dependency_failure());
    }

    #[test]
    fn test_embedding_failure_inspector() {
        assert!(Error::embedding("x").is_embedding_failure());
        assert!(!Error::rerank("x").is_embedding_failure());
        assert_eq!(Error::embedding("x").index_kind(), None);
    }

    #[test]
    fn test_json_error_converts_to_serialization() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
