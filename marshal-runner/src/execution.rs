//! Per-job execution
//!
//! One execution covers resolving the handler, invoking it and enforcing
//! the optional deadline. Whatever happens, the execution ends in a typed
//! `ExecutionResult` that converts into exactly one `JobResult`.
//!
//! Each handler is driven on a dedicated blocking-pool thread, so a
//! handler that blocks inline (file I/O, a synchronous client, heavy
//! compute) neither stalls sibling jobs nor escapes the deadline.

use marshal_core::{JobResult, JobSpec, Payload};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::error::JobError;
use crate::registry::HandlerRegistry;

/// Result of executing a single job
///
/// Only exists while a batch is running; the orchestrator turns it into a
/// `JobResult` immediately.
#[derive(Debug)]
pub enum ExecutionResult {
    Success { payload: Payload, elapsed: Duration },
    Failure { error: JobError, elapsed: Duration },
}

impl ExecutionResult {
    /// Runs `spec` through the handler registered for its type
    ///
    /// On expiry of `timeout` the job is recorded as timed out right away.
    /// Work the handler already started is detached and its result dropped.
    pub async fn execute(
        spec: Arc<JobSpec>,
        registry: &HandlerRegistry,
        timeout: Option<Duration>,
    ) -> Self {
        let started = Instant::now();

        let handler = match registry.resolve(spec.job_type()) {
            Ok(handler) => handler,
            Err(error) => {
                return ExecutionResult::Failure {
                    error,
                    elapsed: started.elapsed(),
                };
            }
        };

        debug!("Executing job '{}' ({})", spec.name(), spec.job_type());

        let runtime = Handle::current();
        let job = Arc::clone(&spec);
        let unit = tokio::task::spawn_blocking(move || runtime.block_on(handler.execute(&job)));

        let joined = match timeout {
            Some(deadline) => match tokio::time::timeout(deadline, unit).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        "Job '{}' exceeded its {:?} deadline; detaching handler",
                        spec.name(),
                        deadline
                    );
                    return ExecutionResult::Failure {
                        error: JobError::Timeout,
                        elapsed: started.elapsed(),
                    };
                }
            },
            None => unit.await,
        };

        let elapsed = started.elapsed();
        let outcome = match joined {
            Ok(result) => result.map_err(JobError::from),
            Err(e) => Err(JobError::from(e)),
        };

        match outcome {
            Ok(payload) => ExecutionResult::Success { payload, elapsed },
            Err(error) => ExecutionResult::Failure { error, elapsed },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            ExecutionResult::Success { elapsed, .. } => *elapsed,
            ExecutionResult::Failure { elapsed, .. } => *elapsed,
        }
    }

    /// Converts the execution into the job's result record
    pub fn into_job_result(self, spec: &JobSpec) -> JobResult {
        match self {
            ExecutionResult::Success { payload, elapsed } => {
                JobResult::succeeded(spec.name(), spec.job_type(), payload, elapsed)
            }
            ExecutionResult::Failure { error, elapsed } => error.into_result(spec, elapsed),
        }
    }
}
