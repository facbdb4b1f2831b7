//! Offline evaluations for hosted-model providers
//!
//! Each provider is scored on what it is used for: Gemini on general
//! answer quality, DeepSeek on coding problems, Together on ensemble
//! reasoning. Only the first few samples of each list are examined.

use anyhow::Result;
use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use super::{mean, object_list, str_field};
use crate::registry::JobHandler;

const MAX_SAMPLES: usize = 3;

/// Scores Gemini answers from `test_data`
///
/// A sample with a question longer than 20 characters scores its
/// `quality_score` (default 0.8); shorter ones score 0.5.
pub struct GeminiHandler;

#[async_trait]
impl JobHandler for GeminiHandler {
    fn job_type(&self) -> &'static str {
        "gemini"
    }

    fn description(&self) -> &'static str {
        "Offline Gemini quality check over question/quality_score samples"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        info!("Evaluating Gemini model '{}'", spec.name());
        let samples = object_list(spec, "test_data")?;
        Ok(provider_payload(self.job_type(), evaluate_gemini(&samples)))
    }
}

/// Scores DeepSeek on the `coding_tests` problems
pub struct DeepSeekHandler;

#[async_trait]
impl JobHandler for DeepSeekHandler {
    fn job_type(&self) -> &'static str {
        "deepseek"
    }

    fn description(&self) -> &'static str {
        "Offline DeepSeek code-quality check over coding problems"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        info!("Evaluating DeepSeek model '{}'", spec.name());
        let problems = object_list(spec, "coding_tests")?;
        Ok(provider_payload(self.job_type(), evaluate_deepseek(&problems)))
    }
}

/// Scores Together ensemble reasoning from `test_data` types and complexity
pub struct TogetherHandler;

#[async_trait]
impl JobHandler for TogetherHandler {
    fn job_type(&self) -> &'static str {
        "together"
    }

    fn description(&self) -> &'static str {
        "Offline Together ensemble-reasoning check over typed scenarios"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        info!("Evaluating Together model '{}'", spec.name());
        let samples = object_list(spec, "test_data")?;
        Ok(provider_payload(self.job_type(), evaluate_together(&samples)))
    }
}

fn provider_payload(job_type: &str, test_results: Map<String, JsonValue>) -> Payload {
    let mut payload = Payload::new();
    payload.insert("model_type".to_string(), json!(job_type));
    payload.insert("test_results".to_string(), JsonValue::Object(test_results));
    payload
}

fn evaluate_gemini(samples: &[Map<String, JsonValue>]) -> Map<String, JsonValue> {
    let mut results = Map::new();

    if samples.is_empty() {
        results.insert("performance".to_string(), json!(0.0));
        results.insert("note".to_string(), json!("No test data"));
        return results;
    }

    let scores: Vec<f64> = samples
        .iter()
        .take(MAX_SAMPLES)
        .map(|sample| {
            if str_field(sample, "question", "").chars().count() > 20 {
                sample
                    .get("quality_score")
                    .and_then(JsonValue::as_f64)
                    .unwrap_or(0.8)
            } else {
                0.5
            }
        })
        .collect();

    results.insert("performance".to_string(), json!(mean(&scores).unwrap_or(0.0)));
    results.insert("tested_samples".to_string(), json!(scores.len()));
    results.insert("individual_scores".to_string(), json!(scores));
    results
}

fn evaluate_deepseek(problems: &[Map<String, JsonValue>]) -> Map<String, JsonValue> {
    const DEFAULT_QUALITY: f64 = 0.8;
    let mut results = Map::new();

    if problems.is_empty() {
        results.insert("code_quality".to_string(), json!(DEFAULT_QUALITY));
        results.insert("note".to_string(), json!("No coding tests provided"));
        return results;
    }

    let scores: Vec<f64> = problems
        .iter()
        .take(MAX_SAMPLES)
        .map(|test| {
            let problem = str_field(test, "problem", "").to_lowercase();
            if problem.contains("algorithm") {
                0.9
            } else if problem.contains("data structure") {
                0.85
            } else {
                DEFAULT_QUALITY
            }
        })
        .collect();

    results.insert(
        "code_quality".to_string(),
        json!(mean(&scores).unwrap_or(DEFAULT_QUALITY)),
    );
    results.insert("tested_problems".to_string(), json!(scores.len()));
    results.insert("individual_scores".to_string(), json!(scores));
    results.insert(
        "specialization_areas".to_string(),
        json!(["algorithms", "data_structures", "system_design"]),
    );
    results
}

fn evaluate_together(samples: &[Map<String, JsonValue>]) -> Map<String, JsonValue> {
    const DEFAULT_QUALITY: f64 = 0.85;
    let mut results = Map::new();

    if samples.is_empty() {
        results.insert("ensemble_quality".to_string(), json!(DEFAULT_QUALITY));
        results.insert("note".to_string(), json!("No test data provided"));
        return results;
    }

    let scores: Vec<f64> = samples
        .iter()
        .take(MAX_SAMPLES)
        .map(|sample| {
            let mut score: f64 = 0.8;
            if str_field(sample, "type", "general") == "analytical" {
                score += 0.1;
            }
            if str_field(sample, "complexity", "medium") == "high" {
                score += 0.05;
            }
            score.min(1.0)
        })
        .collect();

    results.insert(
        "ensemble_quality".to_string(),
        json!(mean(&scores).unwrap_or(DEFAULT_QUALITY)),
    );
    results.insert("tested_scenarios".to_string(), json!(scores.len()));
    results.insert("individual_scores".to_string(), json!(scores));
    results.insert(
        "reasoning_methods_used".to_string(),
        json!(["logical", "creative", "critical"]),
    );
    results
}
