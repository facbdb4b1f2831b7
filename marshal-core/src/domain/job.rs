//! Job domain types

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Free-form job parameters, forwarded unmodified to the handler
pub type Parameters = serde_json::Map<String, JsonValue>;

/// Handler output: metrics, artifact paths and anything else it reports
pub type Payload = serde_json::Map<String, JsonValue>;

/// Description of one unit of work
///
/// Built by the caller before a batch and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    name: String,
    job_type: String,
    #[serde(default)]
    parameters: Parameters,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, job_type: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            job_type: job_type.into(),
            parameters,
        }
    }

    /// Creates a spec with no parameters
    pub fn bare(name: impl Into<String>, job_type: impl Into<String>) -> Self {
        Self::new(name, job_type, Parameters::new())
    }

    /// Name of the job, unique within a batch
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type tag used to select the handler
    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Looks up a single parameter
    pub fn parameter(&self, key: &str) -> Option<&JsonValue> {
        self.parameters.get(key)
    }
}

/// Terminal state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Succeeded,
    /// The handler returned an error
    Failed,
    /// The job exceeded the configured deadline
    TimedOut,
    /// The handler panicked
    Panicked,
    /// No handler is registered for the job type
    Unsupported,
}

impl JobStatus {
    pub fn is_success(self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed out",
            JobStatus::Panicked => "panicked",
            JobStatus::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one job
///
/// Exactly one is created per submitted job. A failed result always carries
/// a non-empty error; a successful one never does. Deserialization rejects
/// records that break this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JobResultRecord")]
pub struct JobResult {
    job_name: String,
    job_type: String,
    success: bool,
    status: JobStatus,
    payload: Payload,
    error: Option<String>,
    duration_ms: u64,
}

impl JobResult {
    /// Creates a successful result
    pub fn succeeded(
        job_name: impl Into<String>,
        job_type: impl Into<String>,
        payload: Payload,
        duration: Duration,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            job_type: job_type.into(),
            success: true,
            status: JobStatus::Succeeded,
            payload,
            error: None,
            duration_ms: duration_millis(duration),
        }
    }

    /// Creates a failed result
    ///
    /// `status` is coerced to `Failed` if `Succeeded` is passed, and an empty
    /// error message is replaced so the result never fails silently.
    pub fn failed(
        job_name: impl Into<String>,
        job_type: impl Into<String>,
        status: JobStatus,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let status = if status.is_success() {
            JobStatus::Failed
        } else {
            status
        };

        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }

        Self {
            job_name: job_name.into(),
            job_type: job_type.into(),
            success: false,
            status,
            payload: Payload::new(),
            error: Some(error),
            duration_ms: duration_millis(duration),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Wall-clock time spent in the job's execution unit
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// Wire form of `JobResult`, checked before it becomes one
#[derive(Deserialize)]
struct JobResultRecord {
    job_name: String,
    job_type: String,
    success: bool,
    status: JobStatus,
    #[serde(default)]
    payload: Payload,
    error: Option<String>,
    duration_ms: u64,
}

impl TryFrom<JobResultRecord> for JobResult {
    type Error = String;

    fn try_from(record: JobResultRecord) -> Result<Self, Self::Error> {
        if record.success != record.status.is_success() {
            return Err(format!(
                "job '{}': success={} contradicts status '{}'",
                record.job_name, record.success, record.status
            ));
        }

        match (record.success, record.error.as_deref()) {
            (true, Some(_)) => {
                return Err(format!(
                    "job '{}': successful result carries an error",
                    record.job_name
                ));
            }
            (false, None) => {
                return Err(format!("job '{}': failed result has no error", record.job_name));
            }
            (false, Some(error)) if error.trim().is_empty() => {
                return Err(format!("job '{}': failed result has an empty error", record.job_name));
            }
            _ => {}
        }

        Ok(Self {
            job_name: record.job_name,
            job_type: record.job_type,
            success: record.success,
            status: record.status,
            payload: record.payload,
            error: record.error,
            duration_ms: record.duration_ms,
        })
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
