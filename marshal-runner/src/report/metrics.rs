//! Metric and artifact extraction from handler payloads

use marshal_core::Payload;
use serde_json::Value as JsonValue;

/// Nested object whose numeric fields are also reported as metrics
const NESTED_METRICS_KEY: &str = "test_results";

/// Returns the numeric fields of `payload` as `(key, value)` pairs
///
/// Top-level numbers come first, then numbers inside `test_results` keyed
/// as `test_results.<field>`. Booleans and all other values are skipped.
pub fn extract_metrics(payload: &Payload) -> Vec<(String, f64)> {
    let mut metrics: Vec<(String, f64)> = payload
        .iter()
        .filter_map(|(key, value)| numeric(value).map(|n| (key.clone(), n)))
        .collect();
    metrics.sort_by(|a, b| a.0.cmp(&b.0));

    if let Some(JsonValue::Object(nested)) = payload.get(NESTED_METRICS_KEY) {
        let mut nested_metrics: Vec<(String, f64)> = nested
            .iter()
            .filter_map(|(key, value)| {
                numeric(value).map(|n| (format!("{}.{}", NESTED_METRICS_KEY, key), n))
            })
            .collect();
        nested_metrics.sort_by(|a, b| a.0.cmp(&b.0));
        metrics.extend(nested_metrics);
    }

    metrics
}

/// Returns artifact paths referenced by `payload`
///
/// Recognized keys are `model_path`, anything ending in `_path` with a string
/// value, and objects ending in `_paths` whose string values are paths.
pub fn extract_artifacts(payload: &Payload) -> Vec<(String, String)> {
    let mut artifacts = Vec::new();

    for (key, value) in payload {
        match value {
            JsonValue::String(path) if key.ends_with("_path") => {
                artifacts.push((key.clone(), path.clone()));
            }
            JsonValue::Object(paths) if key.ends_with("_paths") => {
                for (sub, path) in paths {
                    if let JsonValue::String(path) = path {
                        artifacts.push((format!("{}.{}", key, sub), path.clone()));
                    }
                }
            }
            _ => {}
        }
    }

    artifacts.sort();
    artifacts
}

fn numeric(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        _ => None,
    }
}
