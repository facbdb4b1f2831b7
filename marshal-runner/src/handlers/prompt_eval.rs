use anyhow::Result;
use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use super::{object_list, str_field};
use crate::registry::JobHandler;

const MAX_SAMPLES: usize = 5;
const MIN_TEXT_LEN: usize = 10;

/// Offline check of a provider prompt against its `test_data`
///
/// A sample counts as answered when both its question and expected
/// response are substantive. Also registered under the `groq` tag.
pub struct PromptEvalHandler;

#[async_trait]
impl JobHandler for PromptEvalHandler {
    fn job_type(&self) -> &'static str {
        "prompt_eval"
    }

    fn description(&self) -> &'static str {
        "Offline prompt evaluation against question/expected_response samples"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        info!(
            "Evaluating prompt for '{}' ({})",
            spec.name(),
            spec.job_type()
        );

        let samples = object_list(spec, "test_data")?;

        let mut payload = Payload::new();
        payload.insert("model_type".to_string(), json!(spec.job_type()));
        payload.insert("test_results".to_string(), JsonValue::Object(evaluate(&samples)));
        Ok(payload)
    }
}

fn evaluate(samples: &[Map<String, JsonValue>]) -> Map<String, JsonValue> {
    let mut results = Map::new();

    if samples.is_empty() {
        results.insert("accuracy".to_string(), json!(0.0));
        results.insert("note".to_string(), json!("No test data"));
        return results;
    }

    let correct = samples
        .iter()
        .take(MAX_SAMPLES)
        .filter(|sample| {
            substantive(str_field(sample, "question", ""))
                && substantive(str_field(sample, "expected_response", ""))
        })
        .count();

    // Only the first samples are checked, but accuracy is over all of them
    let total = samples.len();
    results.insert("accuracy".to_string(), json!(correct as f64 / total as f64));
    results.insert("tested_samples".to_string(), json!(total));
    results.insert("correct_responses".to_string(), json!(correct));
    results
}

fn substantive(text: &str) -> bool {
    text.chars().count() > MIN_TEXT_LEN
}

#[cfg(test)]
mod tests {
    use super::*;
    use marshal_core::Parameters;

    fn spec(job_type: &str, samples: JsonValue) -> JobSpec {
        let mut params = Parameters::new();
        params.insert("test_data".to_string(), samples);
        JobSpec::new("prompt", job_type, params)
    }

    #[tokio::test]
    async fn test_accuracy() {
        let payload = PromptEvalHandler
            .execute(&spec(
                "groq",
                json!([
                    {"question": "Analyze Apple stock", "expected_response": "Advanced financial analysis"},
                    {"question": "short", "expected_response": "Detailed code and explanation"}
                ]),
            ))
            .await
            .unwrap();

        assert_eq!(payload["model_type"], json!("groq"));
        assert_eq!(payload["test_results"]["accuracy"], json!(0.5));
        assert_eq!(payload["test_results"]["correct_responses"], json!(1));
    }

    #[tokio::test]
    async fn test_no_data() {
        let payload = PromptEvalHandler
            .execute(&JobSpec::bare("prompt", "gemini"))
            .await
            .unwrap();
        assert_eq!(payload["test_results"]["accuracy"], json!(0.0));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 6 characters, 12 bytes
        assert!(!substantive("تحليلا"));
        assert!(substantive("تحليل البيانات"));
    }
}
