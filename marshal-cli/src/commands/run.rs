//! Run command
//!
//! Executes a batch document with the built-in handlers, prints a
//! per-job summary and persists the report. Individual job failures are
//! reported, not turned into a non-zero exit.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use marshal_core::{BatchOutcome, JobResult, JobStatus, Summary};
use marshal_runner::handlers::builtin_registry;
use marshal_runner::report::extract_metrics;
use marshal_runner::{Orchestrator, ReportGenerator, RunnerConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::load_document;
use crate::config::Config;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the batch document (JSON)
    batch: PathBuf,

    /// Maximum number of jobs running at once
    #[arg(long)]
    max_parallel: Option<usize>,

    /// Per-job deadline in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Also write the batch outcome as JSON to this path
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Skip writing the Markdown report
    #[arg(long)]
    no_report: bool,
}

pub async fn handle_run(args: RunArgs, config: &Config) -> Result<()> {
    let document = load_document(&args.batch)?;
    let runner_config = resolve_runner_config(&args, document.apply_overrides(config.runner.clone()))?;
    let report_dir = runner_config.report_dir.clone();
    info!(
        "Loaded {} job(s) (max parallel: {:?}, timeout: {:?})",
        document.jobs.len(),
        runner_config.max_parallel_jobs,
        runner_config.job_timeout
    );

    println!(
        "{}",
        format!("Running {} job(s) from {}", document.jobs.len(), args.batch.display()).bold()
    );

    let orchestrator = Orchestrator::new(builtin_registry(), runner_config);
    let outcome = orchestrator
        .run_batch(document.jobs)
        .await
        .context("Batch could not start")?;

    println!();
    for result in outcome.iter() {
        print_job_result(result);
    }

    let summary = if args.no_report {
        outcome.summary()
    } else {
        let artifact = ReportGenerator::to_dir(&report_dir)
            .generate(&outcome)
            .context("Failed to write report")?;
        println!("{} {}", "Report:".bold(), artifact.location.cyan());
        artifact.summary
    };

    if let Some(path) = &args.json_out {
        write_outcome_json(&outcome, path)?;
        println!("{} {}", "Outcome:".bold(), path.display().to_string().cyan());
    }

    print_summary(&summary);
    Ok(())
}

/// Applies command-line overrides on top of the document-adjusted config
fn resolve_runner_config(args: &RunArgs, mut runner: RunnerConfig) -> Result<RunnerConfig> {
    if let Some(max) = args.max_parallel {
        runner.max_parallel_jobs = Some(max);
    }
    if let Some(secs) = args.timeout_secs {
        runner.job_timeout = Some(Duration::from_secs(secs));
    }
    runner.validate().context("Invalid run options")?;
    Ok(runner)
}

fn write_outcome_json(outcome: &BatchOutcome, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write outcome to {}", path.display()))
}

/// Print one job's result
fn print_job_result(result: &JobResult) {
    println!(
        "  {} {} ({})",
        if result.success() {
            "✓".green()
        } else {
            "✗".red()
        },
        result.job_name().bold(),
        result.job_type().to_uppercase().dimmed()
    );
    println!("    Status:   {}", colorize_status(result.status()));
    println!("    Duration: {} ms", result.duration_ms());

    match result.error() {
        Some(error) => println!("    Error:    {}", error.red()),
        None => {
            for (metric, value) in extract_metrics(result.payload()) {
                println!("    {}: {:.3}", metric.cyan(), value);
            }
        }
    }
    println!();
}

fn print_summary(summary: &Summary) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  Total:        {}", summary.total);
    println!("  Succeeded:    {}", summary.succeeded.to_string().green());
    println!(
        "  Failed:       {}",
        if summary.failed > 0 {
            summary.failed.to_string().red()
        } else {
            summary.failed.to_string().normal()
        }
    );
    println!("  Success rate: {:.1}%", summary.success_percent());
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.to_string();
    match status {
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::TimedOut => status_str.yellow(),
        JobStatus::Panicked => status_str.magenta(),
        JobStatus::Unsupported => status_str.dimmed(),
    }
}
