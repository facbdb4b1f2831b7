//! Batch documents
//!
//! A batch document is JSON: either a top-level array of job entries, or
//! an object with a `jobs` array plus optional run overrides. Each entry
//! names its job (`name` or `model_name`) and type (`job_type` or
//! `model_type`); every other key becomes a handler parameter.

use marshal_core::{JobSpec, Parameters};
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::RunnerConfig;
use crate::error::DocumentError;

const NAME_KEYS: [&str; 2] = ["name", "model_name"];
const TYPE_KEYS: [&str; 2] = ["job_type", "model_type"];

/// Parsed batch document
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDocument {
    pub jobs: Vec<JobSpec>,
    pub max_parallel_jobs: Option<usize>,
    pub job_timeout: Option<Duration>,
}

impl BatchDocument {
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        let value: JsonValue = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: JsonValue) -> Result<Self, DocumentError> {
        match value {
            JsonValue::Array(entries) => Ok(Self {
                jobs: parse_entries(entries)?,
                max_parallel_jobs: None,
                job_timeout: None,
            }),
            JsonValue::Object(mut object) => {
                let entries = match object.remove("jobs") {
                    Some(JsonValue::Array(entries)) => entries,
                    Some(_) => {
                        return Err(DocumentError::InvalidBatchDocument(
                            "`jobs` must be an array".to_string(),
                        ));
                    }
                    None => {
                        return Err(DocumentError::InvalidBatchDocument(
                            "missing `jobs` array".to_string(),
                        ));
                    }
                };

                let max_parallel_jobs = optional_u64(&object, "max_parallel_jobs")?
                    .map(|n| {
                        usize::try_from(n).map_err(|_| {
                            DocumentError::InvalidBatchDocument(format!(
                                "`max_parallel_jobs` is too large: {}",
                                n
                            ))
                        })
                    })
                    .transpose()?;
                let job_timeout = optional_u64(&object, "job_timeout_secs")?.map(Duration::from_secs);

                Ok(Self {
                    jobs: parse_entries(entries)?,
                    max_parallel_jobs,
                    job_timeout,
                })
            }
            _ => Err(DocumentError::InvalidBatchDocument(
                "expected an array of jobs or an object with a `jobs` array".to_string(),
            )),
        }
    }

    /// Applies the document's overrides on top of `config`
    pub fn apply_overrides(&self, mut config: RunnerConfig) -> RunnerConfig {
        if let Some(max) = self.max_parallel_jobs {
            config.max_parallel_jobs = Some(max);
        }
        if let Some(timeout) = self.job_timeout {
            config.job_timeout = Some(timeout);
        }
        config
    }
}

fn parse_entries(entries: Vec<JsonValue>) -> Result<Vec<JobSpec>, DocumentError> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| spec_from_entry(index, entry))
        .collect()
}

/// Builds a spec from one document entry
///
/// A missing name defaults to `model_{index}`. The type is trimmed and
/// lower-cased; a missing or empty type is an error.
pub fn spec_from_entry(index: usize, entry: JsonValue) -> Result<JobSpec, DocumentError> {
    let JsonValue::Object(mut fields) = entry else {
        return Err(DocumentError::InvalidBatchDocument(format!(
            "job entry {} is not an object",
            index
        )));
    };

    let name = take_string(&mut fields, &NAME_KEYS, index)?
        .unwrap_or_else(|| format!("model_{}", index));

    let job_type = take_string(&mut fields, &TYPE_KEYS, index)?
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            DocumentError::InvalidBatchDocument(format!("job entry {} has no job type", index))
        })?;

    let parameters: Parameters = fields;
    Ok(JobSpec::new(name, job_type, parameters))
}

/// Removes the alias present in `fields`, requiring a string
///
/// Supplying more than one alias for the same field is an error.
fn take_string(
    fields: &mut Parameters,
    keys: &[&str],
    index: usize,
) -> Result<Option<String>, DocumentError> {
    let present: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| fields.contains_key(*key))
        .collect();

    let key = match present.as_slice() {
        [] => return Ok(None),
        [key] => *key,
        _ => {
            return Err(DocumentError::InvalidBatchDocument(format!(
                "job entry {}: conflicting keys {}",
                index,
                present.join(" and ")
            )));
        }
    };

    match fields.remove(key) {
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(DocumentError::InvalidBatchDocument(format!(
            "job entry {}: `{}` must be a string, got {}",
            index, key, other
        ))),
        None => Ok(None),
    }
}

fn optional_u64(
    object: &serde_json::Map<String, JsonValue>,
    key: &str,
) -> Result<Option<u64>, DocumentError> {
    match object.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => value.as_u64().filter(|n| *n > 0).map(Some).ok_or_else(|| {
            DocumentError::InvalidBatchDocument(format!("`{}` must be a positive integer", key))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_document() {
        let doc = BatchDocument::from_value(json!([
            {"model_name": "Groq_Primary", "model_type": "GROQ", "test_data": []},
            {"name": "agents", "job_type": "multi_agent", "agents": ["pm", "quant"]}
        ]))
        .unwrap();

        assert_eq!(doc.jobs.len(), 2);
        assert_eq!(doc.jobs[0].name(), "Groq_Primary");
        assert_eq!(doc.jobs[0].job_type(), "groq");
        assert_eq!(doc.jobs[0].parameter("test_data"), Some(&json!([])));
        assert!(doc.jobs[0].parameter("model_type").is_none());
        assert_eq!(doc.jobs[1].parameter("agents"), Some(&json!(["pm", "quant"])));
        assert_eq!(doc.max_parallel_jobs, None);
    }

    #[test]
    fn test_object_document_with_overrides() {
        let doc = BatchDocument::from_json(
            r#"{"max_parallel_jobs": 2, "job_timeout_secs": 60,
                "jobs": [{"model_type": "sleep"}]}"#,
        )
        .unwrap();

        assert_eq!(doc.jobs[0].name(), "model_0");
        assert_eq!(doc.max_parallel_jobs, Some(2));
        assert_eq!(doc.job_timeout, Some(Duration::from_secs(60)));

        let config = doc.apply_overrides(RunnerConfig::default());
        assert_eq!(config.max_parallel_jobs, Some(2));
        assert_eq!(config.job_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_missing_type_is_rejected() {
        let err = BatchDocument::from_value(json!([{"name": "a"}])).unwrap_err();
        assert!(err.to_string().contains("no job type"));
    }

    #[test]
    fn test_non_object_entry_is_rejected() {
        let err = BatchDocument::from_value(json!([42])).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidBatchDocument(_)));
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = BatchDocument::from_value(json!({"jobs": [], "max_parallel_jobs": 0}))
            .unwrap_err();
        assert!(err.to_string().contains("max_parallel_jobs"));
    }

    #[test]
    fn test_conflicting_name_aliases_are_rejected() {
        let err = BatchDocument::from_value(json!([
            {"name": "a", "model_name": "b", "job_type": "sleep"}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("conflicting keys name and model_name"));

        let err = BatchDocument::from_value(json!([
            {"name": "a", "job_type": "sleep", "model_type": 7}
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("job_type and model_type"));
    }

    #[test]
    fn test_non_string_name_is_rejected() {
        let err = BatchDocument::from_value(json!([{"model_name": 3, "job_type": "sleep"}]))
            .unwrap_err();
        assert!(err.to_string().contains("`model_name` must be a string"));
    }

    #[test]
    fn test_invalid_json() {
        let err = BatchDocument::from_json("{not json").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }
}
