//! Reranker adapter.

use sift_core::{Error, RankedList, Result};
use std::sync::Arc;

use crate::scorer::PairScorer;

/// Reorders candidates by cross-encoder score and truncates to `k_rerank`.
#[derive(Clone)]
pub struct Reranker {
    scorer: Arc<dyn PairScorer>,
}

impl Reranker {
    /// Wrap a shared scorer handle.
    pub fn new(scorer: Arc<dyn PairScorer>) -> Self {
        Self { scorer }
    }

    /// Name of the underlying scorer.
    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    /// Rerank `candidates` for `query`, keeping the best `k_rerank`.
    ///
    /// Each kept candidate's `score` is replaced with its cross-encoder
    /// score. The scorer is not called when there is nothing to keep.
    ///
    /// # Errors
    ///
    /// Propagates scorer failures, and returns [`Error::RerankFailure`] if
    /// the scorer returns the wrong number of scores.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: RankedList,
        k_rerank: usize,
    ) -> Result<RankedList> {
        if candidates.is_empty() || k_rerank == 0 {
            return Ok(RankedList::new());
        }

        let scores = {
            let passages = candidates.texts();
            self.scorer.score_pairs(query, &passages).await?
        };
        if scores.len() != candidates.len() {
            return Err(Error::rerank(format!(
                "Scorer '{}' returned {} scores for {} passages",
                self.scorer.name(),
                scores.len(),
                candidates.len()
            )));
        }

        let order = order_by_scores(&scores, k_rerank);
        let mut pool: Vec<_> = candidates.into_inner().into_iter().map(Some).collect();
        Ok(order
            .into_iter()
            .filter_map(|idx| pool[idx].take().map(|c| c.with_score(scores[idx])))
            .collect())
    }

    /// Rerank bare passage texts.
    pub async fn rerank_texts(
        &self,
        query: &str,
        passages: &[String],
        k_rerank: usize,
    ) -> Result<Vec<String>> {
        if passages.is_empty() || k_rerank == 0 {
            return Ok(Vec::new());
        }
        let refs: Vec<&str> = passages.iter().map(String::as_str).collect();
        let scores = self.scorer.score_pairs(query, &refs).await?;
        if scores.len() != passages.len() {
            return Err(Error::rerank(format!(
                "Scorer '{}' returned {} scores for {} passages",
                self.scorer.name(),
                scores.len(),
                passages.len()
            )));
        }
        Ok(order_by_scores(&scores, k_rerank)
            .into_iter()
            .map(|idx| passages[idx].clone())
            .collect())
    }
}

impl std::fmt::Debug for Reranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reranker")
            .field("scorer", &self.scorer.name())
            .finish()
    }
}

/// Input indices sorted by descending score, ties by index, cut to `k`.
///
/// NaN scores sort last.
pub fn order_by_scores(scores: &[f32], k: usize) -> Vec<usize> {
    let key = |s: f32| if s.is_nan() { f32::NEG_INFINITY } else { s };
    let mut ranking: Vec<usize> = (0..scores.len()).collect();
    ranking.sort_by(|&a, &b| {
        key(scores[b])
            .total_cmp(&key(scores[a]))
            .then(a.cmp(&b))
    });
    ranking.truncate(k);
    ranking
}

// ============================================================================
// Tests
// ============================================================================
