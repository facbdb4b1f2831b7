//! Runner configuration
//!
//! Defines the tunable parameters of a batch run: optional concurrency
//! bound, optional per-job deadline, and where reports are written.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_REPORT_DIR: &str = "logs";

/// Runner configuration
///
/// Both limits are off by default: every job starts immediately and no job
/// is ever cut short.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Maximum number of jobs whose handlers run at the same time
    pub max_parallel_jobs: Option<usize>,

    /// Deadline applied to each job individually
    pub job_timeout: Option<Duration>,

    /// Directory that receives rendered reports
    pub report_dir: PathBuf,
}

impl RunnerConfig {
    /// Creates a configuration with no limits
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            max_parallel_jobs: None,
            job_timeout: None,
            report_dir: report_dir.into(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables:
    /// - MARSHAL_MAX_PARALLEL_JOBS (optional, default: unbounded)
    /// - MARSHAL_JOB_TIMEOUT (optional, seconds, default: none)
    /// - MARSHAL_REPORT_DIR (optional, default: logs)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_parallel_jobs = lookup("MARSHAL_MAX_PARALLEL_JOBS")
            .map(|s| parse_value::<usize>("MARSHAL_MAX_PARALLEL_JOBS", &s))
            .transpose()?;

        let job_timeout = lookup("MARSHAL_JOB_TIMEOUT")
            .map(|s| parse_value::<u64>("MARSHAL_JOB_TIMEOUT", &s))
            .transpose()?
            .map(Duration::from_secs);

        let report_dir = lookup("MARSHAL_REPORT_DIR")
            .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string());

        let config = Self {
            max_parallel_jobs,
            job_timeout,
            report_dir: PathBuf::from(report_dir),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the per-job deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    /// Bounds the number of concurrently running handlers
    pub fn with_max_parallel_jobs(mut self, max: usize) -> Self {
        self.max_parallel_jobs = Some(max);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_jobs == Some(0) {
            return Err(ConfigError::Invalid {
                key: "max_parallel_jobs",
                value: "0".to_string(),
            });
        }

        if self.job_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::Invalid {
                key: "job_timeout",
                value: "0".to_string(),
            });
        }

        if self.report_dir.as_os_str().is_empty() {
            return Err(ConfigError::Missing("report_dir"));
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_DIR)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
