//! The `sift` application.
//!
//! Loads configuration, builds the backends the configuration names, and
//! dispatches commands.

use crate::cli::{CliArgs, Command, QueryArgs};
use crate::config::{EmbeddingConfig, LexicalConfig, RerankConfig, SiftConfig};
use crate::config_handlers;
use crate::corpus::{CorpusRecord, load_corpus};
use serde::Serialize;
use sift_core::{Candidate, Error, Result, StageTiming};
use sift_fts::{LexicalIndex, SimpleLexicalIndex};
use sift_rerank::{OverlapScorer, PairScorer};
use sift_retrieval::{Retrieval, Retriever};
use sift_vector::{EmbeddingProvider, HashingEmbeddingProvider, SimpleVectorIndex};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SiftCli
// ============================================================================

/// The CLI application.
pub struct SiftCli {
    config: SiftConfig,
    version: String,
}

impl SiftCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = SiftConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// Create with an already loaded config.
    pub fn new(config: SiftConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The loaded configuration.
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        match args.command {
            Some(Command::Query(query)) => {
                let output = self.query(&query).await?;
                if query.json {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    print!("{}", output.render_text());
                }
                Ok(())
            }
            Some(Command::Version) => {
                println!("sift {}", self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("sift {}: use --help for usage", self.version);
                Ok(())
            }
        }
    }

    /// Run one query against the configured corpus.
    pub async fn query(&self, args: &QueryArgs) -> Result<QueryOutput> {
        let settings = args.apply_to(&self.config.retrieval);
        let retrieval_config = settings.to_config()?;

        let corpus_path = args
            .corpus
            .clone()
            .or_else(|| self.config.corpus.path.clone())
            .map(PathBuf::from)
            .ok_or_else(|| {
                Error::config("No corpus configured; pass --corpus or set corpus.path")
            })?;
        let records = load_corpus(&corpus_path)?;

        let retriever = build_retriever(&self.config, records, settings.use_rerank)
            .await?
            .with_fallback(settings.fallback);

        let report = match settings.timeout() {
            Some(timeout) => tokio::time::timeout(
                timeout,
                retriever.retrieve_report(&args.text, &retrieval_config),
            )
            .await
            .map_err(|_| Error::Timeout(timeout))??,
            None => retriever.retrieve_report(&args.text, &retrieval_config).await?,
        };

        if let Some(note) = &report.degraded {
            tracing::warn!(note = %note, "served degraded results");
        }
        tracing::info!(
            passages = report.passages.len(),
            rank_type = %retrieval_config.rank_type,
            "query complete"
        );

        Ok(QueryOutput::new(&args.text, report))
    }
}

/// Initialise tracing-based logging.
///
/// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
/// `log` records from the library crates are forwarded to the subscriber.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// Output
// ============================================================================

/// What `sift query` prints.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutput {
    /// The query text.
    pub query: String,
    /// Passages in rank order, without embeddings.
    pub passages: Vec<Candidate>,
    /// Stage timings.
    pub timings: Vec<StageTiming>,
    /// Degradation note, if a fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl QueryOutput {
    fn new(query: &str, report: Retrieval) -> Self {
        let passages = report
            .passages
            .into_iter()
            .map(|mut c| {
                c.embedding = None;
                c
            })
            .collect();
        Self {
            query: query.to_string(),
            passages,
            timings: report.timings,
            degraded: report.degraded,
        }
    }

    /// Numbered plain-text listing.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if self.passages.is_empty() {
            out.push_str("No passages found.\n");
        }
        for (idx, passage) in self.passages.iter().enumerate() {
            let score = passage
                .score
                .map(|s| format!(" ({s:.4})"))
                .unwrap_or_default();
            out.push_str(&format!(
                "{}. [{}]{score}\n   {}\n",
                idx + 1,
                passage.id,
                passage.text
            ));
        }
        out
    }
}

// ============================================================================
// Backend construction
// ============================================================================

/// Build the configured embedding provider.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "hashing" => Ok(Arc::new(HashingEmbeddingProvider::new(config.dimension))),
        #[cfg(feature = "vector-fastembed")]
        "fastembed" => {
            let mut provider =
                sift_vector::FastEmbedProvider::new(&config.model, config.cache_path.as_deref())?;
            if let Some(prefix) = &config.query_prefix {
                provider = provider.with_query_prefix(prefix.clone());
            }
            Ok(Arc::new(provider))
        }
        #[cfg(not(feature = "vector-fastembed"))]
        "fastembed" => Err(Error::config(
            "The fastembed provider requires the `vector-fastembed` feature",
        )),
        other => Err(Error::config(format!(
            "Unknown embedding provider '{other}', expected 'hashing' or 'fastembed'"
        ))),
    }
}

/// Build the configured cross-encoder scorer.
pub fn build_scorer(config: &RerankConfig) -> Result<Arc<dyn PairScorer>> {
    match config.scorer.as_str() {
        "overlap" => Ok(Arc::new(OverlapScorer::new())),
        #[cfg(feature = "rerank-fastembed")]
        "fastembed" => Ok(Arc::new(sift_rerank::FastEmbedScorer::new(
            &config.model,
            config.cache_path.as_deref(),
        )?)),
        #[cfg(not(feature = "rerank-fastembed"))]
        "fastembed" => Err(Error::config(
            "The fastembed scorer requires the `rerank-fastembed` feature",
        )),
        other => Err(Error::config(format!(
            "Unknown rerank scorer '{other}', expected 'overlap' or 'fastembed'"
        ))),
    }
}

/// Build the configured lexical index over `records`.
pub fn build_lexical_index(
    config: &LexicalConfig,
    records: &[CorpusRecord],
) -> Result<Arc<dyn LexicalIndex>> {
    match config.backend.as_str() {
        "simple" => {
            let index = SimpleLexicalIndex::new();
            for record in records {
                index.insert(record.id.as_str(), record.text.as_str())?;
            }
            Ok(Arc::new(index))
        }
        #[cfg(feature = "fts-tantivy")]
        "tantivy" => {
            let index = match &config.index_path {
                Some(dir) => sift_fts::TantivyLexicalIndex::open_or_create(std::path::Path::new(dir))?,
                None => sift_fts::TantivyLexicalIndex::in_ram()?,
            };
            index.add_documents(records.iter().map(|r| (r.id.as_str(), r.text.as_str())))?;
            Ok(Arc::new(index))
        }
        #[cfg(not(feature = "fts-tantivy"))]
        "tantivy" => Err(Error::config(
            "The tantivy backend requires the `fts-tantivy` feature",
        )),
        other => Err(Error::config(format!(
            "Unknown lexical backend '{other}', expected 'simple' or 'tantivy'"
        ))),
    }
}

/// Build a retriever over `records`, embedding chunks that lack a vector.
///
/// The scorer is only loaded when `with_rerank` is set.
pub async fn build_retriever(
    config: &SiftConfig,
    records: Vec<CorpusRecord>,
    with_rerank: bool,
) -> Result<Retriever> {
    let embedder = build_embedder(&config.embedding)?;

    let missing: Vec<&str> = records
        .iter()
        .filter(|r| r.embedding.is_none())
        .map(|r| r.text.as_str())
        .collect();
    let computed = if missing.is_empty() {
        Vec::new()
    } else {
        log::info!("Embedding {} chunks with {}", missing.len(), embedder.name());
        embedder.embed_batch(&missing).await?
    };
    let mut computed = computed.into_iter();

    let vector_index = SimpleVectorIndex::new(embedder.dimension());
    for record in &records {
        let embedding = match &record.embedding {
            Some(embedding) => embedding.clone(),
            None => computed
                .next()
                .ok_or_else(|| Error::embedding("Embedder returned too few vectors"))?,
        };
        vector_index.insert(record.id.as_str(), record.text.as_str(), embedding)?;
    }

    let lexical_index = build_lexical_index(&config.lexical, &records)?;

    let mut retriever = Retriever::new(embedder, Arc::new(vector_index), lexical_index);
    if with_rerank {
        retriever = retriever.with_scorer(build_scorer(&config.rerank)?);
    }
    Ok(retriever)
}

// ============================================================================
// Tests
// ============================================================================
