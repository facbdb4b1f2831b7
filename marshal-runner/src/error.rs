//! Error types for the runner
//!
//! Batch-level errors propagate to the caller before any job starts.
//! Job-level errors never propagate: they are converted into a failed
//! `JobResult` at the boundary of the job that raised them.

use marshal_core::{JobResult, JobSpec, JobStatus};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Structural errors that prevent a batch from starting
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    /// No jobs were submitted
    #[error("batch is empty")]
    EmptyBatch,

    /// Two jobs in the batch share a name
    #[error("duplicate job name in batch: {0}")]
    DuplicateJobName(String),
}

/// Errors raised while executing a single job
#[derive(Debug, Error)]
pub enum JobError {
    /// No handler is registered for the job type
    #[error("unsupported job type: {0}")]
    UnsupportedJobType(String),

    /// The handler returned an error
    #[error("{0}")]
    HandlerFailure(String),

    /// The job exceeded its deadline
    #[error("timeout")]
    Timeout,

    /// The handler panicked
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Status recorded for this error
    pub fn status(&self) -> JobStatus {
        match self {
            JobError::UnsupportedJobType(_) => JobStatus::Unsupported,
            JobError::HandlerFailure(_) => JobStatus::Failed,
            JobError::Timeout => JobStatus::TimedOut,
            JobError::Panicked(_) => JobStatus::Panicked,
        }
    }

    /// Converts the error into the failed result for `spec`
    pub fn into_result(self, spec: &JobSpec, elapsed: Duration) -> JobResult {
        JobResult::failed(
            spec.name(),
            spec.job_type(),
            self.status(),
            self.to_string(),
            elapsed,
        )
    }
}

impl From<anyhow::Error> for JobError {
    fn from(err: anyhow::Error) -> Self {
        JobError::HandlerFailure(format!("{:#}", err))
    }
}

impl From<JoinError> for JobError {
    /// Panics keep their message; cancellation is a plain failure
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return JobError::HandlerFailure("job task was cancelled".to_string());
        }

        let panic = err.into_panic();
        let message = if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        JobError::Panicked(message)
    }
}

/// Errors from persisting a rendered report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("report sink error: {0}")]
    Sink(String),
}

/// Errors from loading runner configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Errors from parsing a batch document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse batch document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid batch document: {0}")]
    InvalidBatchDocument(String),
}
