//! Candidate passages and ranked lists.
//!
//! A [`Candidate`] is one passage flowing through a retrieval call. Identity is
//! the `id`: two candidates are the same item when their ids match, whichever
//! index produced them. A [`RankedList`] is an ordered, duplicate-free sequence
//! of candidates where position 0 is rank 1.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// Candidate
// ============================================================================

/// A passage considered during one retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable identifier. Within a call, `id` determines `text`.
    pub id: String,

    /// Passage text handed to the chat model.
    pub text: String,

    /// Stored embedding, when the producing index supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Stage-specific score (similarity, BM25, fused, or cross-encoder).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Candidate {
    /// Create a candidate with no embedding and no score.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding: None,
            score: None,
        }
    }

    /// Attach an embedding.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach a score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

// ============================================================================
// RankedList
// ============================================================================

/// An ordered sequence of candidates, best first, with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedList {
    items: Vec<Candidate>,
}

impl RankedList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from candidates in rank order.
    ///
    /// Later duplicates of an id are dropped, so the first occurrence keeps
    /// its rank.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let mut seen = HashSet::with_capacity(candidates.len());
        let items = candidates
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        Self { items }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.items.iter()
    }

    /// Candidates as a slice, in rank order.
    pub fn as_slice(&self) -> &[Candidate] {
        &self.items
    }

    /// The candidate at 1-based `rank`.
    pub fn at_rank(&self, rank: usize) -> Option<&Candidate> {
        rank.checked_sub(1).and_then(|i| self.items.get(i))
    }

    /// Keep only the first `len` candidates.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Ids in rank order.
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.id.as_str()).collect()
    }

    /// Passage texts in rank order.
    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|c| c.text.as_str()).collect()
    }

    /// Consume the list, returning passage texts in rank order.
    pub fn into_texts(self) -> Vec<String> {
        self.items.into_iter().map(|c| c.text).collect()
    }

    /// Consume the list, returning the candidates.
    pub fn into_inner(self) -> Vec<Candidate> {
        self.items
    }
}

impl From<Vec<Candidate>> for RankedList {
    fn from(candidates: Vec<Candidate>) -> Self {
        Self::from_candidates(candidates)
    }
}

impl FromIterator<Candidate> for RankedList {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        Self::from_candidates(iter.into_iter().collect())
    }
}

impl IntoIterator for RankedList {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
