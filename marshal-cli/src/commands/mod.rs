//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod run;
mod types;
mod validate;

use anyhow::{Context, Result};
use clap::Subcommand;
use marshal_runner::BatchDocument;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a batch of jobs and write a report
    Run(run::RunArgs),
    /// List registered job types
    Types,
    /// Check a batch document without running it
    Validate {
        /// Path to the batch document (JSON)
        batch: PathBuf,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run(args, config).await,
        Commands::Types => types::handle_types(),
        Commands::Validate { batch } => validate::handle_validate(&batch),
    }
}

/// Reads and parses a batch document from disk
pub(crate) fn load_document(path: &Path) -> Result<BatchDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch document {}", path.display()))?;
    BatchDocument::from_json(&text)
        .with_context(|| format!("Failed to parse batch document {}", path.display()))
}
