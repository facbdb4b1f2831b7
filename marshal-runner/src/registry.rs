use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::JobError;

/// Trait for job handlers.
///
/// Each handler executes one kind of job. It receives the job's spec, owns
/// no batch-level state, and either returns a payload or fails.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use marshal_core::{JobSpec, Payload};
/// use marshal_runner::JobHandler;
///
/// struct EchoHandler;
///
/// #[async_trait]
/// impl JobHandler for EchoHandler {
///     fn job_type(&self) -> &'static str {
///         "echo"
///     }
///
///     async fn execute(&self, spec: &JobSpec) -> anyhow::Result<Payload> {
///         Ok(spec.parameters().clone())
///     }
/// }
/// ```
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Returns the job-type tag this handler is registered under by default.
    fn job_type(&self) -> &'static str;

    /// Executes one job.
    ///
    /// Runs on a dedicated blocking-pool thread, so inline blocking calls
    /// are allowed and do not hold up other jobs.
    ///
    /// # Errors
    /// Any error is recorded as the job's failure; it never aborts the batch.
    async fn execute(&self, spec: &JobSpec) -> anyhow::Result<Payload>;

    /// Short human-readable description, shown by `marshal types`.
    fn description(&self) -> &'static str {
        ""
    }
}

/// Registry mapping job-type tags to handlers
///
/// Populated at startup; shared read-only (behind an `Arc`) while a batch
/// runs.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Associates `job_type` with `handler`
    ///
    /// Re-registering an existing tag replaces the previous handler, which
    /// is returned.
    pub fn register(
        &mut self,
        job_type: impl Into<String>,
        handler: Arc<dyn JobHandler>,
    ) -> Option<Arc<dyn JobHandler>> {
        let job_type = job_type.into();
        let previous = self.handlers.insert(job_type.clone(), handler);
        if previous.is_some() {
            warn!("Handler for job type '{}' replaced", job_type);
        } else {
            debug!("Registered handler for job type '{}'", job_type);
        }
        previous
    }

    /// Registers a handler under its own `job_type()`
    pub fn register_handler<H: JobHandler + 'static>(&mut self, handler: H) -> Arc<dyn JobHandler> {
        let handler: Arc<dyn JobHandler> = Arc::new(handler);
        self.register(handler.job_type(), Arc::clone(&handler));
        handler
    }

    /// Registers an existing handler under an additional tag
    pub fn register_alias(&mut self, alias: impl Into<String>, handler: &Arc<dyn JobHandler>) {
        self.register(alias, Arc::clone(handler));
    }

    /// Returns the handler for `job_type`
    ///
    /// # Errors
    /// `JobError::UnsupportedJobType` when nothing is registered for the tag
    pub fn resolve(&self, job_type: &str) -> Result<Arc<dyn JobHandler>, JobError> {
        self.handlers
            .get(job_type)
            .cloned()
            .ok_or_else(|| JobError::UnsupportedJobType(job_type.to_string()))
    }

    pub fn contains(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered tags, sorted
    pub fn job_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
