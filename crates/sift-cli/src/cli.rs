//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};
use sift_core::RankType;
use sift_retrieval::FallbackPolicy;

use crate::config::RetrievalSettings;

// ============================================================================
// CLI argument types
// ============================================================================

/// Passage retrieval and ranking over a JSONL corpus.
#[derive(Parser, Debug)]
#[command(name = "sift", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "SIFT_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Retrieve passages for a query.
    Query(QueryArgs),

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Arguments for `sift query`. Unset options fall back to the config file.
#[derive(Parser, Debug, Default)]
pub struct QueryArgs {
    /// Query text.
    pub text: String,

    /// JSONL corpus to search (overrides `corpus.path`).
    #[arg(long)]
    pub corpus: Option<String>,

    /// Retrieval strategy: semantic, lexical, or hybrid.
    #[arg(short = 't', long)]
    pub rank_type: Option<RankType>,

    /// Number of passages to return.
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Candidate pool size for vector search.
    #[arg(long)]
    pub k_fetch: Option<usize>,

    /// Passages kept after reranking.
    #[arg(long)]
    pub k_rerank: Option<usize>,

    /// MMR trade-off between relevance (1.0) and diversity (0.0).
    #[arg(short, long)]
    pub lambda: Option<f32>,

    /// RRF constant for hybrid fusion.
    #[arg(long)]
    pub rrf_k: Option<u32>,

    /// Rerank results with the configured scorer.
    #[arg(short, long)]
    pub rerank: bool,

    /// Behavior when a backend fails: fail or degrade.
    #[arg(long)]
    pub fallback: Option<FallbackPolicy>,

    /// Per-query deadline in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print the full report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl QueryArgs {
    /// Overlay command-line options on configured settings.
    pub fn apply_to(&self, settings: &RetrievalSettings) -> RetrievalSettings {
        let mut merged = settings.clone();
        if let Some(k) = self.k {
            merged.k = k;
        }
        if let Some(k_fetch) = self.k_fetch {
            merged.k_fetch = Some(k_fetch);
        }
        if let Some(k_rerank) = self.k_rerank {
            merged.k_rerank = k_rerank;
        }
        if let Some(lambda) = self.lambda {
            merged.lambda_mult = lambda;
        }
        if let Some(rrf_k) = self.rrf_k {
            merged.rrf_k = rrf_k;
        }
        if let Some(rank_type) = self.rank_type {
            merged.rank_type = rank_type;
        }
        if self.rerank {
            merged.use_rerank = true;
        }
        if let Some(fallback) = self.fallback {
            merged.fallback = fallback;
        }
        if self.timeout_ms.is_some() {
            merged.timeout_ms = self.timeout_ms;
        }
        merged
    }
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_with_options() {
        let args = CliArgs::parse_from([
            "sift",
            "query",
            "what resolves a dominant chord",
            "--rank-type",
            "hybrid",
            "-k",
            "5",
            "--lambda",
            "0.3",
            "--rerank",
            "--fallback",
            "degrade",
            "--json",
        ]);
        match args.command {
            Some(Command::Query(query)) => {
                assert_eq!(query.text, "what resolves a dominant chord");
                assert_eq!(query.rank_type, Some(RankType::Hybrid));
                assert_eq!(query.k, Some(5));
                assert_eq!(query.lambda, Some(0.3));
                assert!(query.rerank);
                assert_eq!(query.fallback, Some(FallbackPolicy::Degrade));
                assert!(query.json);
            }
            other => panic!("expected query command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_rank_type() {
        let result = CliArgs::try_parse_from(["sift", "query", "q", "--rank-type", "fuzzy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_init() {
        let args = CliArgs::parse_from(["sift", "-v", "config", "init", "--force"]);
        assert!(args.verbose);
        match args.command {
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { file, force },
            })) => {
                assert!(file.is_none());
                assert!(force);
            }
            other => panic!("expected config init, got {other:?}"),
        }
    }

    #[test]
    fn test_apply_to_overrides_only_given_options() {
        let base = RetrievalSettings {
            k: 20,
            k_fetch: Some(40),
            ..Default::default()
        };
        let args = QueryArgs {
            text: "q".into(),
            k: Some(4),
            rank_type: Some(RankType::Lexical),
            ..Default::default()
        };
        let merged = args.apply_to(&base);
        assert_eq!(merged.k, 4);
        assert_eq!(merged.k_fetch, Some(40));
        assert_eq!(merged.rank_type, RankType::Lexical);
        assert!(!merged.use_rerank);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
