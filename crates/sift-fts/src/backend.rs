//! Lexical index abstraction and in-memory BM25 implementation.

use async_trait::async_trait;
use sift_core::text::terms;
use sift_core::{Candidate, Error, IndexKind, RankedList, Result};
use std::collections::HashMap;
use std::sync::RwLock;

/// Read-only full-text search over stored chunks.
///
/// Implementations return at most `limit` candidates ordered by descending
/// relevance, each with `score` set to the backend's relevance score. Backend
/// failures should be reported as [`Error::IndexUnavailable`] with
/// [`IndexKind::Lexical`].
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Return the `limit` best full-text matches for `query`.
    async fn search(&self, query: &str, limit: usize) -> Result<RankedList>;

    /// The backend name for diagnostics.
    fn name(&self) -> &str;
}

/// BM25 term-frequency saturation.
const BM25_K1: f32 = 1.2;

/// BM25 length normalization.
const BM25_B: f32 = 0.75;

struct IndexedDoc {
    id: String,
    text: String,
    term_freqs: HashMap<String, u32>,
    length: usize,
}

#[derive(Default)]
struct Inner {
    docs: Vec<IndexedDoc>,
    doc_freqs: HashMap<String, u32>,
    total_length: usize,
}

impl Inner {
    fn remove(&mut self, pos: usize) {
        let doc = self.docs.remove(pos);
        self.total_length -= doc.length;
        for term in doc.term_freqs.keys() {
            if let Some(df) = self.doc_freqs.get_mut(term) {
                *df -= 1;
                if *df == 0 {
                    self.doc_freqs.remove(term);
                }
            }
        }
    }
}

/// In-memory BM25 index.
///
/// Documents with equal scores keep insertion order. Documents matching no
/// query term are never returned.
#[derive(Default)]
pub struct SimpleLexicalIndex {
    inner: RwLock<Inner>,
}

impl SimpleLexicalIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.inner.read().map(|i| i.docs.len()).unwrap_or(0)
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index a document, replacing any existing document with the same id.
    pub fn insert(&self, id: impl Into<String>, text: impl Into<String>) -> Result<()> {
        let id = id.into();
        let text = text.into();

        let tokens = terms(&text);
        let mut term_freqs: HashMap<String, u32> = HashMap::new();
        for token in &tokens {
            *term_freqs.entry(token.clone()).or_insert(0) += 1;
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| Error::index(IndexKind::Lexical, format!("Lock poisoned: {e}")))?;
        if let Some(pos) = inner.docs.iter().position(|d| d.id == id) {
            inner.remove(pos);
        }
        for term in term_freqs.keys() {
            *inner.doc_freqs.entry(term.clone()).or_insert(0) += 1;
        }
        inner.total_length += tokens.len();
        inner.docs.push(IndexedDoc {
            id,
            text,
            term_freqs,
            length: tokens.len(),
        });
        Ok(())
    }
}

#[async_trait]
impl LexicalIndex for SimpleLexicalIndex {
    async fn search(&self, query: &str, limit: usize) -> Result<RankedList> {
        let inner = self
            .inner
            .read()
            .map_err(|e| Error::index(IndexKind::Lexical, format!("Lock poisoned: {e}")))?;
        if limit == 0 || inner.docs.is_empty() {
            return Ok(RankedList::new());
        }

        let mut query_terms = terms(query);
        query_terms.sort_unstable();
        query_terms.dedup();

        let n = inner.docs.len() as f32;
        let avg_len = (inner.total_length as f32 / n).max(1.0);

        let idf: Vec<(&str, f32)> = query_terms
            .iter()
            .filter_map(|t| {
                let df = *inner.doc_freqs.get(t)? as f32;
                Some((t.as_str(), ((n - df + 0.5) / (df + 0.5) + 1.0).ln()))
            })
            .collect();
        if idf.is_empty() {
            return Ok(RankedList::new());
        }

        let mut scored: Vec<(usize, f32)> = Vec::new();
        for (pos, doc) in inner.docs.iter().enumerate() {
            let mut score = 0.0f32;
            let mut matched = false;
            for (term, term_idf) in &idf {
                let Some(&tf) = doc.term_freqs.get(*term) else {
                    continue;
                };
                matched = true;
                let tf = tf as f32;
                let norm = BM25_K1 * (1.0 - BM25_B + BM25_B * doc.length as f32 / avg_len);
                score += term_idf * tf * (BM25_K1 + 1.0) / (tf + norm);
            }
            if matched {
                scored.push((pos, score));
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let doc = &inner.docs[pos];
                Candidate::new(doc.id.clone(), doc.text.clone()).with_score(score)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "simple"
    }
}

impl std::fmt::Debug for SimpleLexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleLexicalIndex")
            .field("docs", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> SimpleLexicalIndex {
        let index = SimpleLexicalIndex::new();
        index
            .insert("cadence", "A perfect cadence moves from dominant to tonic.")
            .unwrap();
        index
            .insert("voice", "Voice leading keeps common tones between chords.")
            .unwrap();
        index
            .insert(
                "dominant",
                "The dominant chord creates tension. The dominant resolves.",
            )
            .unwrap();
        index
            .insert("bread", "Sourdough bread needs a long fermentation.")
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_search_ranks_by_bm25() {
        let results = corpus().search("dominant", 10).await.unwrap();
        assert_eq!(results.ids(), vec!["dominant", "cadence"]);
        let scores: Vec<f32> = results.iter().filter_map(|c| c.score).collect();
        assert!(scores[0] > scores[1]);
    }

    #[tokio::test]
    async fn test_non_matching_documents_excluded() {
        let results = corpus().search("fermentation", 10).await.unwrap();
        assert_eq!(results.ids(), vec!["bread"]);
    }

    #[tokio::test]
    async fn test_unknown_terms_return_empty() {
        assert!(corpus().search("xylophone", 10).await.unwrap().is_empty());
        assert!(corpus().search("", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let results = corpus().search("dominant chords tonic", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(corpus().search("dominant", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_equal_scores_keep_insertion_order() {
        let index = SimpleLexicalIndex::new();
        index.insert("first", "modal mixture").unwrap();
        index.insert("second", "modal mixture").unwrap();
        let results = index.search("modal", 2).await.unwrap();
        assert_eq!(results.ids(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_insert_replaces_document() {
        let index = corpus();
        index.insert("bread", "Rye dough").unwrap();
        assert_eq!(index.len(), 4);
        assert!(index.search("sourdough", 5).await.unwrap().is_empty());
        assert_eq!(index.search("rye", 5).await.unwrap().ids(), vec!["bread"]);
    }

    #[tokio::test]
    async fn test_empty_index() {
        let index = SimpleLexicalIndex::new();
        assert!(index.is_empty());
        assert!(index.search("anything", 5).await.unwrap().is_empty());
    }
}
