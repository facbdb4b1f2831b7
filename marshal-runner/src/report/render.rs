//! Markdown rendering of a batch outcome
//!
//! Rendering is a pure function of the outcome and its summary: the same
//! input always produces the same text.

use marshal_core::{BatchOutcome, JobResult, Summary};

use super::metrics::{extract_artifacts, extract_metrics};

const SUCCEEDED_RECOMMENDATIONS: [&str; 3] = [
    "Monitor model performance regularly",
    "Refresh training data periodically",
    "Evaluate models against fresh data",
];

const FAILED_RECOMMENDATIONS: [&str; 4] = [
    "Review the training configuration",
    "Check the quality of the input data",
    "Try a different architecture",
    "Increase the amount of training data",
];

/// Renders the report text for `outcome`
pub fn render(outcome: &BatchOutcome, summary: &Summary) -> String {
    let mut lines = vec![
        "# Training Report".to_string(),
        String::new(),
        format!("- **Batch**: {}", outcome.batch_id()),
        format!(
            "- **Completed at**: {}",
            outcome.completed_at().format("%Y-%m-%d %H:%M:%S UTC")
        ),
        format!("- **Jobs**: {}", outcome.len()),
        String::new(),
        "## Results".to_string(),
        String::new(),
    ];

    for result in outcome.iter() {
        lines.extend(job_section(result));
    }

    lines.extend([
        "## Statistics".to_string(),
        String::new(),
        format!("- **Total**: {}", summary.total),
        format!("- **Succeeded**: {}", summary.succeeded),
        format!("- **Failed**: {}", summary.failed),
        format!("- **Success rate**: {:.1}%", summary.success_percent()),
        String::new(),
    ]);

    if summary.succeeded > 0 || summary.failed > 0 {
        lines.push("## Recommendations".to_string());
        lines.push(String::new());
    }
    if summary.succeeded > 0 {
        lines.extend(recommendations("Succeeded jobs", &SUCCEEDED_RECOMMENDATIONS));
    }
    if summary.failed > 0 {
        lines.extend(recommendations("Failed jobs", &FAILED_RECOMMENDATIONS));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn job_section(result: &JobResult) -> Vec<String> {
    let mut lines = vec![
        format!("### {}", result.job_name()),
        String::new(),
        format!("- **Type**: {}", result.job_type()),
        format!("- **Status**: {}", result.status()),
    ];

    match result.error() {
        Some(error) => lines.push(format!("- **Error**: {}", error)),
        None => {
            for (metric, value) in extract_metrics(result.payload()) {
                lines.push(format!("- **{}**: {:.3}", metric, value));
            }
            for (key, path) in extract_artifacts(result.payload()) {
                lines.push(format!("- **Artifact** ({}): {}", key, path));
            }
        }
    }

    lines.push(String::new());
    lines
}

fn recommendations(heading: &str, items: &[&str]) -> Vec<String> {
    let mut lines = vec![format!("### {}", heading), String::new()];
    lines.extend(items.iter().map(|item| format!("- {}", item)));
    lines.push(String::new());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use marshal_core::{JobStatus, Payload};
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    fn sample_outcome() -> BatchOutcome {
        let mut payload = Payload::new();
        payload.insert("accuracy".to_string(), json!(0.5));
        payload.insert("model_path".to_string(), json!("models/a.h5"));
        payload.insert("model_type".to_string(), json!("typeX"));

        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        BatchOutcome::from_results(
            Uuid::nil(),
            at,
            at,
            vec![
                JobResult::succeeded("a", "typeX", payload, Duration::ZERO),
                JobResult::failed(
                    "c",
                    "unknown_type",
                    JobStatus::Unsupported,
                    "unsupported job type: unknown_type",
                    Duration::ZERO,
                ),
            ],
        )
    }

    #[test]
    fn test_render_sections() {
        let outcome = sample_outcome();
        let text = render(&outcome, &outcome.summary());

        assert!(text.contains("- **Completed at**: 2026-01-02 03:04:05 UTC"));
        assert!(text.contains("### a\n"));
        assert!(text.contains("- **accuracy**: 0.500"));
        assert!(text.contains("- **Artifact** (model_path): models/a.h5"));
        assert!(!text.contains("model_type**"));
        assert!(text.contains("- **Error**: unsupported job type: unknown_type"));
        assert!(text.contains("- **Success rate**: 50.0%"));
        assert!(text.contains("### Succeeded jobs"));
        assert!(text.contains("### Failed jobs"));
    }

    #[test]
    fn test_render_layout() {
        let outcome = sample_outcome();
        let text = render(&outcome, &outcome.summary());

        assert!(text.starts_with("# Training Report\n\n- **Batch**: "));
        assert!(text.contains(
            "### a\n\n- **Type**: typeX\n- **Status**: succeeded\n- **accuracy**: 0.500\n"
        ));
        assert!(text.contains("### Failed jobs\n\n- Review the training configuration\n"));
        assert!(text.ends_with("- Increase the amount of training data\n\n"));
    }

    #[test]
    fn test_render_follows_submission_order() {
        let outcome = sample_outcome();
        let text = render(&outcome, &outcome.summary());

        let a = text.find("### a\n").unwrap();
        let c = text.find("### c\n").unwrap();
        assert!(a < c);
    }

    #[test]
    fn test_render_is_deterministic() {
        let outcome = sample_outcome();
        let summary = outcome.summary();
        assert_eq!(render(&outcome, &summary), render(&outcome, &summary));
    }
}
