//! Lexical index backed by Tantivy.
//!
//! `TantivyLexicalIndex` stores `(id, text)` pairs in a Tantivy index, either
//! in RAM or in a directory, and answers BM25 queries over the text field.
//! Queries are parsed leniently, so user input with stray quotes or operators
//! never fails the call.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sift_fts::{LexicalIndex, TantivyLexicalIndex};
//!
//! let index = TantivyLexicalIndex::in_ram()?;
//! index.add_documents([("doc-1", "functional harmony"), ("doc-2", "counterpoint")])?;
//! let hits = index.search("harmony", 10).await?;
//! ```

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use sift_core::{Candidate, Error, IndexKind, RankedList, Result};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::backend::LexicalIndex;

/// Memory budget for the index writer.
const WRITER_HEAP_BYTES: usize = 50_000_000;

fn lexical_error(context: &str, err: impl std::fmt::Display) -> Error {
    Error::index(IndexKind::Lexical, format!("{context}: {err}"))
}

/// Tantivy-based lexical index.
pub struct TantivyLexicalIndex {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id_field: Field,
    text_field: Field,
}

impl TantivyLexicalIndex {
    fn schema() -> (Schema, Field, Field) {
        let mut builder = Schema::builder();
        let id_field = builder.add_text_field("id", STRING | STORED);
        let text_field = builder.add_text_field("text", TEXT | STORED);
        (builder.build(), id_field, text_field)
    }

    /// Create an empty index held in memory.
    pub fn in_ram() -> Result<Self> {
        let (schema, id_field, text_field) = Self::schema();
        Self::from_index(Index::create_in_ram(schema), id_field, text_field)
    }

    /// Open the index in `dir`, creating it if the directory is empty.
    pub fn open_or_create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let (schema, _, _) = Self::schema();
        let directory = tantivy::directory::MmapDirectory::open(dir)
            .map_err(|e| lexical_error("Failed to open index directory", e))?;
        let index = Index::open_or_create(directory, schema)
            .map_err(|e| lexical_error("Failed to open index", e))?;

        let schema = index.schema();
        let id_field = schema
            .get_field("id")
            .map_err(|e| lexical_error("Index schema has no id field", e))?;
        let text_field = schema
            .get_field("text")
            .map_err(|e| lexical_error("Index schema has no text field", e))?;
        Self::from_index(index, id_field, text_field)
    }

    fn from_index(index: Index, id_field: Field, text_field: Field) -> Result<Self> {
        let writer: IndexWriter = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| lexical_error("Failed to create writer", e))?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| lexical_error("Failed to create reader", e))?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id_field,
            text_field,
        })
    }

    /// Add or replace documents and commit them.
    ///
    /// Returns the number of documents written.
    pub fn add_documents<I, S, T>(&self, documents: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| lexical_error("Writer lock poisoned", e))?;

        let mut count = 0;
        for (id, text) in documents {
            writer.delete_term(Term::from_field_text(self.id_field, id.as_ref()));
            writer
                .add_document(doc!(
                    self.id_field => id.as_ref(),
                    self.text_field => text.as_ref()
                ))
                .map_err(|e| lexical_error("Failed to add document", e))?;
            count += 1;
        }
        writer
            .commit()
            .map_err(|e| lexical_error("Failed to commit", e))?;
        self.reader
            .reload()
            .map_err(|e| lexical_error("Failed to reload reader", e))?;

        log::debug!("Committed {count} documents to tantivy index");
        Ok(count)
    }

    /// Number of searchable documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

#[async_trait]
impl LexicalIndex for TantivyLexicalIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<RankedList> {
        // TopDocs rejects a zero limit.
        if limit == 0 || query.trim().is_empty() {
            return Ok(RankedList::new());
        }

        let parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let (parsed, _ignored) = parser.parse_query_lenient(query);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&*parsed, &TopDocs::with_limit(limit))
            .map_err(|e| lexical_error("Search failed", e))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| lexical_error("Failed to load document", e))?;
            let id = doc
                .get_first(self.id_field)
                .and_then(|v| v.as_str())
                .ok_or_else(|| lexical_error("Stored document", "missing id"))?;
            let text = doc
                .get_first(self.text_field)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            hits.push(Candidate::new(id, text).with_score(score));
        }
        Ok(RankedList::from_candidates(hits))
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}

impl std::fmt::Debug for TantivyLexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivyLexicalIndex")
            .field("docs", &self.num_docs())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> TantivyLexicalIndex {
        let index = TantivyLexicalIndex::in_ram().unwrap();
        index
            .add_documents([
                ("cadence", "A perfect cadence moves from dominant to tonic."),
                ("voice", "Voice leading keeps common tones between chords."),
                ("bread", "Sourdough bread needs a long fermentation."),
            ])
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_search_finds_matching_document() {
        let results = corpus().search("cadence", 5).await.unwrap();
        assert_eq!(results.ids(), vec!["cadence"]);
        assert!(results.at_rank(1).unwrap().score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_query_is_case_insensitive() {
        let results = corpus().search("Sourdough FERMENTATION", 5).await.unwrap();
        assert_eq!(results.ids(), vec!["bread"]);
    }

    #[tokio::test]
    async fn test_zero_limit_and_empty_query() {
        let index = corpus();
        assert!(index.search("cadence", 0).await.unwrap().is_empty());
        assert!(index.search("   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_documents_replaces_by_id() {
        let index = corpus();
        index.add_documents([("bread", "Rye dough")]).unwrap();
        assert_eq!(index.num_docs(), 3);
        assert!(index.search("sourdough", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_or_create_in_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let index = TantivyLexicalIndex::open_or_create(dir.path()).unwrap();
            index.add_documents([("a", "harmonic rhythm")]).unwrap();
        }
        let reopened = TantivyLexicalIndex::open_or_create(dir.path()).unwrap();
        assert_eq!(reopened.search("rhythm", 5).await.unwrap().ids(), vec!["a"]);
    }
}
