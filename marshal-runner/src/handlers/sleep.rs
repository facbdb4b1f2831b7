use anyhow::{Result, bail};
use async_trait::async_trait;
use marshal_core::{JobSpec, Payload};
use serde_json::{Value as JsonValue, json};
use std::time::Duration;

use crate::registry::JobHandler;

/// Waits `duration_ms`, then succeeds or fails with `fail_message`
///
/// Useful for demos and for exercising timeouts.
pub struct SleepHandler;

#[async_trait]
impl JobHandler for SleepHandler {
    fn job_type(&self) -> &'static str {
        "sleep"
    }

    fn description(&self) -> &'static str {
        "Sleeps for duration_ms, then optionally fails with fail_message"
    }

    async fn execute(&self, spec: &JobSpec) -> Result<Payload> {
        let duration_ms = match spec.parameter("duration_ms") {
            None | Some(JsonValue::Null) => 0,
            Some(value) => match value.as_u64() {
                Some(ms) => ms,
                None => bail!("`duration_ms` must be a non-negative integer, got {}", value),
            },
        };

        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        if let Some(message) = spec.parameter("fail_message").and_then(JsonValue::as_str) {
            bail!("{}", message);
        }

        let mut payload = Payload::new();
        payload.insert("slept_ms".to_string(), json!(duration_ms));
        Ok(payload)
    }
}
