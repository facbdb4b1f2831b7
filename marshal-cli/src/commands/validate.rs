//! Validate command
//!
//! Parses a batch document and reports the problems `run` would hit:
//! structural errors fail the command, unknown job types only warn.

use anyhow::{Context, Result};
use colored::*;
use marshal_runner::handlers::builtin_registry;
use marshal_runner::validate_batch;
use std::path::Path;

use super::load_document;

pub fn handle_validate(path: &Path) -> Result<()> {
    let document = load_document(path)?;

    validate_batch(&document.jobs)
        .with_context(|| format!("Batch document {} cannot run", path.display()))?;

    let registry = builtin_registry();
    let unsupported: Vec<_> = document
        .jobs
        .iter()
        .filter(|spec| !registry.contains(spec.job_type()))
        .collect();

    for spec in &unsupported {
        println!(
            "{} job '{}' has no handler for type '{}'; it will be recorded as failed",
            "warning:".yellow().bold(),
            spec.name(),
            spec.job_type()
        );
    }

    println!(
        "{} {} job(s), {} runnable",
        "✓".green(),
        document.jobs.len(),
        document.jobs.len() - unsupported.len()
    );

    Ok(())
}
