//! Pair scoring trait and a term-overlap implementation.

use async_trait::async_trait;
use sift_core::Result;
use sift_core::text::terms;
use std::collections::HashSet;

/// Scores (query, passage) pairs for relevance.
///
/// Implementations return exactly one score per passage, in input order.
/// Higher is more relevant; the scale is scorer-specific. Failures should be
/// reported as [`sift_core::Error::RerankFailure`].
#[async_trait]
pub trait PairScorer: Send + Sync {
    /// Score each passage against `query`.
    async fn score_pairs(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>>;

    /// The scorer name for diagnostics.
    fn name(&self) -> &str;
}

/// Scores a passage by the fraction of distinct query terms it contains.
///
/// A cheap stand-in for a cross-encoder when no model is available. Scores
/// fall in `[0, 1]`; an empty query scores every passage 0.
#[derive(Debug, Clone, Default)]
pub struct OverlapScorer;

impl OverlapScorer {
    /// Create an overlap scorer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PairScorer for OverlapScorer {
    async fn score_pairs(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        let query_terms: HashSet<String> = terms(query).into_iter().collect();
        if query_terms.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }

        Ok(passages
            .iter()
            .map(|passage| {
                let passage_terms: HashSet<String> = terms(passage).into_iter().collect();
                let hits = query_terms.intersection(&passage_terms).count();
                hits as f32 / query_terms.len() as f32
            })
            .collect())
    }

    fn name(&self) -> &str {
        "overlap"
    }
}
