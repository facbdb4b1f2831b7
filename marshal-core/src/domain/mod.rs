//! Core domain types
//!
//! These types are produced by the runner (orchestration and reporting)
//! and consumed by the CLI for display and export.

pub mod batch;
pub mod job;
pub mod summary;
