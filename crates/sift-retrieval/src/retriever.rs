//! Retrieval orchestrator.
//!
//! [`Retriever`] turns a query into an ordered list of passages using one of
//! three strategies selected by [`RankType`]:
//!
//! - `semantic`: embed the query, fetch `k_fetch` nearest chunks, diversify
//!   to `k` with MMR.
//! - `lexical`: fetch the `k` best full-text matches.
//! - `hybrid`: run both paths concurrently and fuse them with RRF, keeping
//!   the top `k`.
//!
//! With `use_rerank` set, the strategy's list is rescored by the cross-encoder
//! and cut to `k_rerank`.
//!
//! Every backend handle is injected and shared by `Arc`, so one `Retriever`
//! serves any number of concurrent calls. Each call owns its own timing
//! collector and nothing else is mutated.

use serde::Serialize;
use sift_core::{Error, RankType, RankedList, Result, RetrievalConfig, StageTiming, StageTimings};
use sift_fts::LexicalIndex;
use sift_rerank::{PairScorer, Reranker};
use sift_vector::{EmbeddingProvider, VectorIndex, mmr};
use std::sync::Arc;
use std::time::Duration;

use crate::fusion::reciprocal_rank_fusion;
use crate::policy::FallbackPolicy;

/// Outcome of one retrieval call with diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    /// Passages in final rank order.
    pub passages: RankedList,
    /// Per-stage wall-clock timings in completion order.
    pub timings: Vec<StageTiming>,
    /// Set when a fallback policy served a partial strategy.
    pub degraded: Option<String>,
}

impl Retrieval {
    /// Passage texts in rank order.
    pub fn texts(&self) -> Vec<&str> {
        self.passages.texts()
    }

    /// Consume the outcome, returning passage texts in rank order.
    pub fn into_texts(self) -> Vec<String> {
        self.passages.into_texts()
    }
}

/// Composes embedder, indexes, diversifier, fuser, and reranker.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_index: Arc<dyn VectorIndex>,
    lexical_index: Arc<dyn LexicalIndex>,
    reranker: Option<Reranker>,
    fallback: FallbackPolicy,
}

impl Retriever {
    /// Create a retriever over the given backends, without reranking.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        vector_index: Arc<dyn VectorIndex>,
        lexical_index: Arc<dyn LexicalIndex>,
    ) -> Self {
        Self {
            embedder,
            vector_index,
            lexical_index,
            reranker: None,
            fallback: FallbackPolicy::default(),
        }
    }

    /// Attach a cross-encoder scorer for calls with `use_rerank`.
    pub fn with_scorer(mut self, scorer: Arc<dyn PairScorer>) -> Self {
        self.reranker = Some(Reranker::new(scorer));
        self
    }

    /// Set the fallback policy.
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// The active fallback policy.
    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// True if a scorer is attached.
    pub fn can_rerank(&self) -> bool {
        self.reranker.is_some()
    }

    /// Retrieve passage texts for `query`.
    ///
    /// Returns at most `config.result_limit()` passages. An empty index or an
    /// empty candidate pool yields an empty list.
    pub async fn retrieve(&self, query: &str, config: &RetrievalConfig) -> Result<Vec<String>> {
        Ok(self.retrieve_report(query, config).await?.into_texts())
    }

    /// Retrieve ranked candidates, keeping ids and scores.
    pub async fn retrieve_candidates(
        &self,
        query: &str,
        config: &RetrievalConfig,
    ) -> Result<RankedList> {
        Ok(self.retrieve_report(query, config).await?.passages)
    }

    /// Retrieve passage texts, failing with [`Error::Timeout`] if the call
    /// takes longer than `timeout`.
    ///
    /// In-flight backend calls are dropped when the deadline passes.
    pub async fn retrieve_with_timeout(
        &self,
        query: &str,
        config: &RetrievalConfig,
        timeout: Duration,
    ) -> Result<Vec<String>> {
        tokio::time::timeout(timeout, self.retrieve(query, config))
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }

    /// Retrieve ranked candidates along with stage timings and any
    /// degradation note.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the config is invalid or reranking is requested
    ///   without a scorer
    /// - [`Error::EmbeddingFailure`] / [`Error::IndexUnavailable`] from the
    ///   backends, unless absorbed by the fallback policy
    /// - [`Error::RerankFailure`] from the scorer
    pub async fn retrieve_report(
        &self,
        query: &str,
        config: &RetrievalConfig,
    ) -> Result<Retrieval> {
        config.validate()?;
        let reranker = if config.use_rerank {
            Some(self.reranker.as_ref().ok_or_else(|| {
                Error::config("Reranking requested but no reranker is configured")
            })?)
        } else {
            None
        };

        let timings = StageTimings::new();
        let (passages, degraded) = {
            let _total = timings.start("total_retrieve");
            let (mut ranked, degraded) = match config.rank_type {
                RankType::Semantic => self.semantic_or_fallback(query, config, &timings).await?,
                RankType::Lexical => (self.lexical(query, config.k, &timings).await?, None),
                RankType::Hybrid => self.hybrid(query, config, &timings).await?,
            };

            if let Some(reranker) = reranker {
                let _stage = timings.start("rerank");
                ranked = reranker.rerank(query, ranked, config.k_rerank).await?;
            }
            (ranked, degraded)
        };

        log::debug!(
            "Retrieved {} passages ({} strategy, rerank: {})",
            passages.len(),
            config.rank_type,
            config.use_rerank
        );

        Ok(Retrieval {
            passages,
            timings: timings.into_records(),
            degraded,
        })
    }

    // ========================================================================
    // Strategies
    // ========================================================================

    async fn semantic(
        &self,
        query: &str,
        config: &RetrievalConfig,
        timings: &StageTimings,
    ) -> Result<RankedList> {
        if config.k == 0 || config.k_fetch == 0 {
            return Ok(RankedList::new());
        }

        let query_vector = {
            let _stage = timings.start("embed_query");
            self.embedder.embed(query).await?
        };

        let mut pool = {
            let _stage = timings.start("semantic_retrieve");
            self.vector_index
                .search(&query_vector, config.k_fetch)
                .await?
        };
        pool.truncate(config.k_fetch);

        let _stage = timings.start("diversify");
        mmr::select(&query_vector, pool, config.k, config.lambda_mult)
    }

    async fn lexical(&self, query: &str, limit: usize, timings: &StageTimings) -> Result<RankedList> {
        if limit == 0 {
            return Ok(RankedList::new());
        }
        let _stage = timings.start("lexical_retrieve");
        let mut hits = self.lexical_index.search(query, limit).await?;
        hits.truncate(limit);
        Ok(hits)
    }

    async fn semantic_or_fallback(
        &self,
        query: &str,
        config: &RetrievalConfig,
        timings: &StageTimings,
    ) -> Result<(RankedList, Option<String>)> {
        let err = match self.semantic(query, config, timings).await {
            Ok(ranked) => return Ok((ranked, None)),
            Err(err) if self.fallback.absorbs(&err) => err,
            Err(err) => return Err(err),
        };

        let note = format!("semantic retrieval failed, serving lexical results: {err}");
        log::warn!("{note}");
        match self.lexical(query, config.k, timings).await {
            Ok(ranked) => Ok((ranked, Some(note))),
            Err(lexical_err) => {
                log::warn!("Lexical fallback also failed: {lexical_err}");
                Err(err)
            }
        }
    }

    async fn hybrid(
        &self,
        query: &str,
        config: &RetrievalConfig,
        timings: &StageTimings,
    ) -> Result<(RankedList, Option<String>)> {
        let (semantic, lexical) = futures::future::join(
            self.semantic(query, config, timings),
            self.lexical(query, config.k, timings),
        )
        .await;

        let (lists, degraded) = match (semantic, lexical) {
            (Ok(semantic), Ok(lexical)) => (vec![semantic, lexical], None),
            (Err(err), Err(lexical_err)) => {
                log::warn!("Both hybrid paths failed; lexical: {lexical_err}");
                return Err(err);
            }
            (Err(err), Ok(lexical)) if self.fallback.absorbs(&err) => {
                let note = format!("semantic path failed, serving lexical results: {err}");
                log::warn!("{note}");
                (vec![lexical], Some(note))
            }
            (Ok(semantic), Err(err)) if self.fallback.absorbs(&err) => {
                let note = format!("lexical path failed, serving semantic results: {err}");
                log::warn!("{note}");
                (vec![semantic], Some(note))
            }
            (Err(err), Ok(_)) | (Ok(_), Err(err)) => return Err(err),
        };

        let _stage = timings.start("fuse");
        let mut fused = reciprocal_rank_fusion(&lists, config.rrf_k);
        fused.truncate(config.k);
        Ok((fused, degraded))
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedder", &self.embedder.name())
            .field("vector_index", &self.vector_index.name())
            .field("lexical_index", &self.lexical_index.name())
            .field("reranker", &self.reranker)
            .field("fallback", &self.fallback)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
