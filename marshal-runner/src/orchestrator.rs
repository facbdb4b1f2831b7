//! Batch orchestrator
//!
//! Fans a batch out into one task per job and fans the results back in.
//! Each job runs in its own task so a slow or blocking handler never
//! stalls its siblings, and every fault (handler error, unknown type,
//! timeout, panic) is caught at that task's boundary.

use chrono::Utc;
use marshal_core::{BatchOutcome, JobResult, JobSpec};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::error::{BatchError, JobError};
use crate::execution::ExecutionResult;
use crate::registry::HandlerRegistry;

/// Runs batches of jobs against a frozen handler registry
pub struct Orchestrator {
    registry: Arc<HandlerRegistry>,
    config: RunnerConfig,
}

impl Orchestrator {
    /// Creates a new orchestrator
    ///
    /// The registry is frozen here; it cannot change while batches run.
    pub fn new(registry: HandlerRegistry, config: RunnerConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Executes every job in `specs` concurrently
    ///
    /// Returns once every job has reached a terminal state. The outcome holds
    /// exactly one result per submitted spec, in submission order.
    ///
    /// # Errors
    /// `EmptyBatch` or `DuplicateJobName`, raised before any handler runs.
    pub async fn run_batch(&self, specs: Vec<JobSpec>) -> Result<BatchOutcome, BatchError> {
        validate_batch(&specs)?;

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!("Starting batch {} with {} job(s)", batch_id, specs.len());

        let semaphore = self
            .config
            .max_parallel_jobs
            .map(|max| Arc::new(Semaphore::new(max)));

        let specs: Vec<Arc<JobSpec>> = specs.into_iter().map(Arc::new).collect();
        let handles: Vec<(Instant, JoinHandle<JobResult>)> = specs
            .iter()
            .map(|spec| (Instant::now(), self.spawn_job_task(Arc::clone(spec), semaphore.clone())))
            .collect();

        // Awaiting in submission order fixes the result order; completion
        // order is irrelevant because every task is already running.
        let mut results = Vec::with_capacity(handles.len());
        for (spec, (spawned, handle)) in specs.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let job_error = JobError::from(e);
                    error!("Job '{}' task aborted: {}", spec.name(), job_error);
                    job_error.into_result(spec, spawned.elapsed())
                }
            };
            results.push(result);
        }

        let outcome = BatchOutcome::from_results(batch_id, started_at, Utc::now(), results);
        info!(
            "Batch {} completed: {}/{} job(s) succeeded",
            batch_id,
            outcome.succeeded(),
            outcome.len()
        );

        Ok(outcome)
    }

    /// Spawns the execution unit for a single job
    fn spawn_job_task(
        &self,
        spec: Arc<JobSpec>,
        semaphore: Option<Arc<Semaphore>>,
    ) -> JoinHandle<JobResult> {
        let registry = Arc::clone(&self.registry);
        let timeout = self.config.job_timeout;

        tokio::spawn(async move {
            // Held until the job finishes; released on drop
            let _permit = match semaphore {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        warn!("Concurrency limiter unavailable for job '{}': {}", spec.name(), e);
                        None
                    }
                },
                None => None,
            };

            debug!("Job '{}' started", spec.name());
            let execution = ExecutionResult::execute(Arc::clone(&spec), &registry, timeout).await;
            let result = execution.into_job_result(&spec);
            log_terminal_state(&result);
            result
        })
    }
}

/// Rejects structurally invalid batches
///
/// # Errors
/// `EmptyBatch` for no specs, `DuplicateJobName` for the first repeated name
pub fn validate_batch(specs: &[JobSpec]) -> Result<(), BatchError> {
    if specs.is_empty() {
        return Err(BatchError::EmptyBatch);
    }

    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.name()) {
            return Err(BatchError::DuplicateJobName(spec.name().to_string()));
        }
    }

    Ok(())
}

fn log_terminal_state(result: &JobResult) {
    if result.success() {
        info!(
            "Job '{}' succeeded in {} ms",
            result.job_name(),
            result.duration_ms()
        );
    } else {
        warn!(
            "Job '{}' {}: {}",
            result.job_name(),
            result.status(),
            result.error().unwrap_or_default()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::JobHandler;
    use async_trait::async_trait;
    use marshal_core::{JobStatus, Parameters, Payload};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// Sleeps `delay_ms` then reports its own name
    struct DelayHandler;

    #[async_trait]
    impl JobHandler for DelayHandler {
        fn job_type(&self) -> &'static str {
            "delay"
        }

        async fn execute(&self, spec: &JobSpec) -> anyhow::Result<Payload> {
            let delay = spec
                .parameter("delay_ms")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;

            let mut payload = Payload::new();
            payload.insert("name".to_string(), json!(spec.name()));
            Ok(payload)
        }
    }

    struct PanicHandler;

    #[async_trait]
    impl JobHandler for PanicHandler {
        fn job_type(&self) -> &'static str {
            "panic"
        }

        async fn execute(&self, _spec: &JobSpec) -> anyhow::Result<Payload> {
            panic!("exploded mid-training");
        }
    }

    /// Completes only if `parties` jobs are inside `execute` at once
    struct RendezvousHandler(Arc<Barrier>);

    #[async_trait]
    impl JobHandler for RendezvousHandler {
        fn job_type(&self) -> &'static str {
            "rendezvous"
        }

        async fn execute(&self, _spec: &JobSpec) -> anyhow::Result<Payload> {
            self.0.wait().await;
            Ok(Payload::new())
        }
    }

    /// Tracks the peak number of concurrent executions
    struct GaugeHandler {
        current: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for GaugeHandler {
        fn job_type(&self) -> &'static str {
            "gauge"
        }

        async fn execute(&self, _spec: &JobSpec) -> anyhow::Result<Payload> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(Payload::new())
        }
    }

    /// Blocks its worker thread for `block_ms` without yielding
    struct InlineBlockingHandler;

    #[async_trait]
    impl JobHandler for InlineBlockingHandler {
        fn job_type(&self) -> &'static str {
            "inline_blocking"
        }

        async fn execute(&self, spec: &JobSpec) -> anyhow::Result<Payload> {
            let block = spec
                .parameter("block_ms")
                .and_then(|v| v.as_u64())
                .unwrap_or(0);
            std::thread::sleep(Duration::from_millis(block));
            Ok(Payload::new())
        }
    }

    fn delay_spec(name: &str, delay_ms: u64) -> JobSpec {
        let mut params = Parameters::new();
        params.insert("delay_ms".to_string(), json!(delay_ms));
        JobSpec::new(name, "delay", params)
    }

    fn orchestrator(config: RunnerConfig) -> Orchestrator {
        let mut registry = HandlerRegistry::new();
        registry.register_handler(DelayHandler);
        registry.register_handler(PanicHandler);
        registry.register_handler(InlineBlockingHandler);
        Orchestrator::new(registry, config)
    }

    #[test]
    fn test_validate_batch() {
        assert_eq!(validate_batch(&[]), Err(BatchError::EmptyBatch));
        assert_eq!(
            validate_batch(&[JobSpec::bare("x", "a"), JobSpec::bare("x", "b")]),
            Err(BatchError::DuplicateJobName("x".to_string()))
        );
        assert!(validate_batch(&[JobSpec::bare("x", "a"), JobSpec::bare("y", "a")]).is_ok());
    }

    #[tokio::test]
    async fn test_every_job_produces_one_result() {
        let orchestrator = orchestrator(RunnerConfig::default());
        let specs: Vec<JobSpec> = (0..16).map(|i| delay_spec(&format!("job-{i}"), 1)).collect();

        let outcome = orchestrator.run_batch(specs).await.unwrap();
        assert_eq!(outcome.len(), 16);
        for i in 0..16 {
            assert!(outcome.get(&format!("job-{i}")).is_some());
        }
    }

    #[tokio::test]
    async fn test_result_order_follows_submission() {
        let orchestrator = orchestrator(RunnerConfig::default());

        let forward = orchestrator
            .run_batch(vec![
                delay_spec("first", 80),
                delay_spec("second", 40),
                delay_spec("third", 0),
            ])
            .await
            .unwrap();
        let reversed = orchestrator
            .run_batch(vec![
                delay_spec("first", 0),
                delay_spec("second", 40),
                delay_spec("third", 80),
            ])
            .await
            .unwrap();

        let a: Vec<_> = forward.job_names().collect();
        let b: Vec<_> = reversed.job_names().collect();
        assert_eq!(a, vec!["first", "second", "third"]);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let orchestrator = orchestrator(RunnerConfig::default());
        let outcome = orchestrator
            .run_batch(vec![JobSpec::bare("boom", "panic"), delay_spec("fine", 10)])
            .await
            .unwrap();

        let boom = outcome.get("boom").unwrap();
        assert_eq!(boom.status(), JobStatus::Panicked);
        assert!(boom.error().unwrap().contains("exploded mid-training"));
        assert!(outcome.get("fine").unwrap().success());
    }

    #[tokio::test]
    async fn test_panicked_job_duration_excludes_earlier_jobs() {
        let orchestrator = orchestrator(RunnerConfig::default());
        let outcome = orchestrator
            .run_batch(vec![delay_spec("slow", 400), JobSpec::bare("boom", "panic")])
            .await
            .unwrap();

        let boom = outcome.get("boom").unwrap();
        assert_eq!(boom.status(), JobStatus::Panicked);
        assert!(boom.duration_ms() < 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_inline_blocking_handlers_do_not_stall_siblings() {
        let orchestrator = orchestrator(RunnerConfig::default());
        let specs: Vec<JobSpec> = (0..6)
            .map(|i| {
                let mut params = Parameters::new();
                params.insert("block_ms".to_string(), json!(300));
                JobSpec::new(format!("b{i}"), "inline_blocking", params)
            })
            .collect();

        let started = Instant::now();
        let outcome = orchestrator.run_batch(specs).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(outcome.succeeded(), 6);
        // Two workers running them back to back would need 900ms
        assert!(elapsed < Duration::from_millis(750), "took {:?}", elapsed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_applies_to_inline_blocking() {
        let orchestrator =
            orchestrator(RunnerConfig::default().with_timeout(Duration::from_millis(50)));
        let mut params = Parameters::new();
        params.insert("block_ms".to_string(), json!(300));

        let outcome = orchestrator
            .run_batch(vec![JobSpec::new("stuck", "inline_blocking", params)])
            .await
            .unwrap();

        let stuck = outcome.get("stuck").unwrap();
        assert_eq!(stuck.status(), JobStatus::TimedOut);
        assert_eq!(stuck.error(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_jobs_overlap_in_time() {
        let barrier = Arc::new(Barrier::new(3));
        let mut registry = HandlerRegistry::new();
        registry.register_handler(RendezvousHandler(Arc::clone(&barrier)));
        let orchestrator = Orchestrator::new(registry, RunnerConfig::default());

        let specs = vec![
            JobSpec::bare("a", "rendezvous"),
            JobSpec::bare("b", "rendezvous"),
            JobSpec::bare("c", "rendezvous"),
        ];

        // Sequential execution would never release the barrier
        let outcome = tokio::time::timeout(Duration::from_secs(5), orchestrator.run_batch(specs))
            .await
            .expect("jobs did not run concurrently")
            .unwrap();
        assert_eq!(outcome.succeeded(), 3);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_completes_all() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register_handler(GaugeHandler {
            current: Arc::clone(&current),
            peak: Arc::clone(&peak),
        });
        let orchestrator =
            Orchestrator::new(registry, RunnerConfig::default().with_max_parallel_jobs(1));

        let specs: Vec<JobSpec> = (0..5).map(|i| JobSpec::bare(format!("g{i}"), "gauge")).collect();
        let outcome = orchestrator.run_batch(specs).await.unwrap();

        assert_eq!(outcome.succeeded(), 5);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_only_affects_slow_job() {
        let orchestrator =
            orchestrator(RunnerConfig::default().with_timeout(Duration::from_millis(50)));
        let outcome = orchestrator
            .run_batch(vec![delay_spec("slow", 1_000), delay_spec("quick", 0)])
            .await
            .unwrap();

        let slow = outcome.get("slow").unwrap();
        assert_eq!(slow.status(), JobStatus::TimedOut);
        assert_eq!(slow.error(), Some("timeout"));
        assert!(outcome.get("quick").unwrap().success());
    }

    #[tokio::test]
    async fn test_outcome_timestamps() {
        let orchestrator = orchestrator(RunnerConfig::default());
        let outcome = orchestrator.run_batch(vec![delay_spec("a", 5)]).await.unwrap();
        assert!(outcome.completed_at() >= outcome.started_at());
    }
}
