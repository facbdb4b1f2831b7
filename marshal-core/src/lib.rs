//! Marshal Core
//!
//! Core types for the Marshal training-job orchestrator.
//!
//! This crate contains:
//! - Domain types: job descriptions, per-job results, batch outcomes and
//!   summary statistics shared between the runner and the CLI

pub mod domain;

pub use domain::batch::BatchOutcome;
pub use domain::job::{JobResult, JobSpec, JobStatus, Parameters, Payload};
pub use domain::summary::Summary;
