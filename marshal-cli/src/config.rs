//! Configuration module
//!
//! Resolves the runner configuration from the environment, then applies
//! command-line overrides on top.

use anyhow::{Context, Result};
use marshal_runner::RunnerConfig;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Runner settings shared by every command
    pub runner: RunnerConfig,
}

impl Config {
    /// Loads configuration from `MARSHAL_*` environment variables
    pub fn load(report_dir: Option<PathBuf>) -> Result<Self> {
        let mut runner =
            RunnerConfig::from_env().context("Failed to load runner configuration")?;

        if let Some(dir) = report_dir {
            runner.report_dir = dir;
        }

        runner.validate().context("Invalid runner configuration")?;
        Ok(Self { runner })
    }
}
