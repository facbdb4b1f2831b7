//! Report generation
//!
//! Turns a batch outcome into summary statistics and a Markdown report,
//! then hands the text to a `ReportSink` for storage.

mod metrics;
mod render;
mod sink;

pub use metrics::{extract_artifacts, extract_metrics};
pub use sink::{FileSystemSink, MemorySink, ReportSink};

use chrono::{DateTime, Utc};
use marshal_core::{BatchOutcome, Summary};
use std::sync::Arc;
use tracing::info;

use crate::error::ReportError;

/// Everything produced by one report run
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub summary: Summary,
    pub text: String,
    pub location: String,
}

/// Summarizes, renders and persists batch outcomes
#[derive(Clone)]
pub struct ReportGenerator {
    sink: Arc<dyn ReportSink>,
}

impl ReportGenerator {
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Creates a generator writing into `dir`
    pub fn to_dir(dir: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FileSystemSink::new(dir)))
    }

    /// Counts successes and failures
    pub fn summarize(&self, outcome: &BatchOutcome) -> Summary {
        outcome.summary()
    }

    /// Renders the Markdown report
    pub fn render(&self, outcome: &BatchOutcome, summary: &Summary) -> String {
        render::render(outcome, summary)
    }

    /// Stores `text` under a timestamp-derived name
    pub fn persist(&self, text: &str) -> Result<String, ReportError> {
        self.persist_at(text, Utc::now())
    }

    /// Stores `text` under the name derived from `at`
    pub fn persist_at(&self, text: &str, at: DateTime<Utc>) -> Result<String, ReportError> {
        self.sink.write(&report_identifier(at), text)
    }

    /// Summarizes, renders and persists in one call
    pub fn generate(&self, outcome: &BatchOutcome) -> Result<ReportArtifact, ReportError> {
        info!("Generating report for batch {}", outcome.batch_id());

        let summary = self.summarize(outcome);
        let text = self.render(outcome, &summary);
        let location = self.persist(&text)?;

        Ok(ReportArtifact {
            summary,
            text,
            location,
        })
    }
}

/// Report name for a given time, e.g. `training_report_20260102_030405.md`
pub fn report_identifier(at: DateTime<Utc>) -> String {
    format!("training_report_{}.md", at.format("%Y%m%d_%H%M%S"))
}
