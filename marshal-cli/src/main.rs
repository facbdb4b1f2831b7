//! Marshal CLI
//!
//! Command-line interface for running training-job batches.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "marshal")]
#[command(about = "Concurrent training-job batch runner", long_about = None)]
struct Cli {
    /// Directory that receives rendered reports
    #[arg(long, global = true, env = "MARSHAL_REPORT_DIR")]
    report_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marshal_cli=info,marshal_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.report_dir)?;

    handle_command(cli.command, &config).await
}
