//! Built-in job handlers
//!
//! Deterministic evaluations that need no network access or model
//! runtime. They keep the CLI useful out of the box; real deployments
//! register their own handlers next to (or instead of) these.

mod financial;
mod multi_agent;
mod prompt_eval;
mod providers;
mod sleep;

pub use financial::FinancialAgentHandler;
pub use multi_agent::MultiAgentHandler;
pub use prompt_eval::PromptEvalHandler;
pub use providers::{DeepSeekHandler, GeminiHandler, TogetherHandler};
pub use sleep::SleepHandler;

use anyhow::{Result, bail};
use marshal_core::JobSpec;
use serde_json::{Map, Value as JsonValue};

use crate::registry::HandlerRegistry;

/// Provider tags scored by the generic prompt evaluation
pub const PROMPT_PROVIDERS: [&str; 1] = ["groq"];

/// Registers every built-in handler into `registry`
pub fn register_builtin_handlers(registry: &mut HandlerRegistry) {
    registry.register_handler(FinancialAgentHandler);
    registry.register_handler(MultiAgentHandler);
    registry.register_handler(SleepHandler);
    registry.register_handler(GeminiHandler);
    registry.register_handler(DeepSeekHandler);
    registry.register_handler(TogetherHandler);

    let prompt = registry.register_handler(PromptEvalHandler);
    for provider in PROMPT_PROVIDERS {
        registry.register_alias(provider, &prompt);
    }
}

/// Creates a registry holding only the built-in handlers
pub fn builtin_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    register_builtin_handlers(&mut registry);
    registry
}

/// Reads an optional array-of-objects parameter
///
/// A missing or null parameter is an empty list; anything else that is not
/// an array of objects is an error.
pub(crate) fn object_list(spec: &JobSpec, key: &str) -> Result<Vec<Map<String, JsonValue>>> {
    match spec.parameter(key) {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::Object(map) => Ok(map.clone()),
                other => bail!("`{}` entries must be objects, got {}", key, other),
            })
            .collect(),
        Some(other) => bail!("`{}` must be an array, got {}", key, other),
    }
}

/// Reads a string field from a test entry, falling back to `default`
pub(crate) fn str_field<'a>(entry: &'a Map<String, JsonValue>, key: &str, default: &'a str) -> &'a str {
    entry.get(key).and_then(JsonValue::as_str).unwrap_or(default)
}

/// Arithmetic mean; `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
