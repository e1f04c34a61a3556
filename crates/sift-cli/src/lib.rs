//! Command-line front end for Sift.
//!
//! The `sift` binary loads a JSONL corpus, builds in-memory (or tantivy)
//! indexes over it, and runs queries through the [`sift_retrieval::Retriever`].
//!
//! # Modules
//!
//! - [`cli`]: clap argument definitions
//! - [`config`]: `SiftConfig` loading via confyg
//! - [`config_handlers`]: `sift config` subcommands
//! - [`corpus`]: JSONL corpus loading
//! - [`app`]: Backend construction and command dispatch

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod corpus;

pub use app::{SiftCli, init_logging};
pub use cli::CliArgs;
pub use config::SiftConfig;
