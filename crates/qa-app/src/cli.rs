//! CLI argument definitions for the policy QA engine binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Policy QA/search engine — retrieval-augmented answering over a corpus
/// of government grant and policy documents.
#[derive(Parser, Debug)]
#[command(name = "qa-engine", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server bind address (overrides `[server].bind_addr`).
    #[arg(short = 'b', long = "bind")]
    pub bind: Option<String>,

    /// SQLite database path (overrides `[storage].database_path`).
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed the corpus from a JSON fixture file (dev/test convenience;
    /// ingestion proper is out of scope for this engine).
    Seed {
        /// Path to a JSON file of `{policies: [...], chunks: [...]}`.
        path: PathBuf,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QA_CONFIG env var > ./config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QA_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("config.toml")
    }

    /// Resolve the bind address.
    ///
    /// Priority: --bind flag > QA_BIND env var > config file value.
    pub fn resolve_bind_addr(&self, config_bind: &str) -> String {
        if let Some(ref b) = self.bind {
            return b.clone();
        }
        if let Ok(b) = std::env::var("QA_BIND") {
            return b;
        }
        config_bind.to_string()
    }

    /// Resolve the database path.
    ///
    /// Priority: --database flag > config file value.
    pub fn resolve_database_path(&self, config_path: &str) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level.clone().unwrap_or_else(|| config_level.to_string())
    }
}
