//! JSONL corpus loading.
//!
//! Each non-blank line is one chunk: `{"id": "...", "text": "...",
//! "embedding": [...]}` with `embedding` optional. Chunks without an
//! embedding are embedded when the indexes are built.

use serde::{Deserialize, Serialize};
use sift_core::{Error, Result};
use std::path::Path;

/// One stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    /// Stable chunk identifier.
    pub id: String,

    /// Chunk text.
    pub text: String,

    /// Precomputed embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Read a JSONL corpus file.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusRecord>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::not_found(format!("Could not read corpus {}: {e}", path.display()))
    })?;
    let records = parse_corpus(&content)
        .map_err(|e| Error::invalid_data(format!("{}: {e}", path.display())))?;
    log::info!("Loaded {} chunks from {}", records.len(), path.display());
    Ok(records)
}

/// Parse JSONL corpus text.
pub fn parse_corpus(content: &str) -> Result<Vec<CorpusRecord>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::invalid_data(format!("line {}: {e}", idx + 1)))
        })
        .collect()
}
