//! Batch outcome

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::job::JobResult;
use crate::domain::summary::Summary;

/// Aggregate result of one batch run
///
/// Results are keyed by job name and iterate in submission order,
/// independent of the order in which jobs completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "BatchOutcomeRecord")]
pub struct BatchOutcome {
    batch_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    results: IndexMap<String, JobResult>,
}

impl BatchOutcome {
    /// Builds an outcome from results already in submission order
    pub fn from_results(
        batch_id: Uuid,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        results: impl IntoIterator<Item = JobResult>,
    ) -> Self {
        let results = results
            .into_iter()
            .map(|result| (result.job_name().to_string(), result))
            .collect();

        Self {
            batch_id,
            started_at,
            completed_at,
            results,
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Looks up the result for a job by name
    pub fn get(&self, job_name: &str) -> Option<&JobResult> {
        self.results.get(job_name)
    }

    /// Iterates results in submission order
    pub fn iter(&self) -> impl Iterator<Item = &JobResult> {
        self.results.values()
    }

    /// Job names in submission order
    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn summary(&self) -> Summary {
        Summary::from_counts(self.succeeded(), self.failed())
    }
}

/// Wire form of `BatchOutcome`, checked before it becomes one
#[derive(Deserialize)]
struct BatchOutcomeRecord {
    batch_id: Uuid,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    results: IndexMap<String, JobResult>,
}

impl TryFrom<BatchOutcomeRecord> for BatchOutcome {
    type Error = String;

    fn try_from(record: BatchOutcomeRecord) -> Result<Self, Self::Error> {
        if let Some((key, result)) = record
            .results
            .iter()
            .find(|(key, result)| key.as_str() != result.job_name())
        {
            return Err(format!(
                "result stored under '{}' belongs to job '{}'",
                key,
                result.job_name()
            ));
        }

        if record.completed_at < record.started_at {
            return Err(format!(
                "batch {} completed before it started",
                record.batch_id
            ));
        }

        Ok(Self {
            batch_id: record.batch_id,
            started_at: record.started_at,
            completed_at: record.completed_at,
            results: record.results,
        })
    }
}
