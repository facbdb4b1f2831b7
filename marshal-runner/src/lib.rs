//! Marshal Runner
//!
//! Orchestration core for heterogeneous training-job batches.
//!
//! Architecture:
//! - Registry: maps a job-type tag to the handler that executes it
//! - Orchestrator: runs a batch concurrently, one task per job, and
//!   converts every per-job fault into a failed result
//! - Report: summarizes, renders and persists a batch outcome
//! - Handlers: built-in deterministic handlers for common job types
//!
//! Batch-level structural errors (empty batch, duplicate names) are the
//! only failures that escape `run_batch`.

pub mod config;
pub mod document;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod orchestrator;
pub mod registry;
pub mod report;

pub use config::RunnerConfig;
pub use document::BatchDocument;
pub use error::{BatchError, ConfigError, DocumentError, JobError, ReportError};
pub use orchestrator::{Orchestrator, validate_batch};
pub use registry::{HandlerRegistry, JobHandler};
pub use report::{FileSystemSink, MemorySink, ReportArtifact, ReportGenerator, ReportSink};
