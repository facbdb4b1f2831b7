//! Summary statistics over a batch

use serde::{Deserialize, Serialize};

/// Aggregate counts for one batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `succeeded / total`, in `[0, 1]`; zero for an empty batch
    pub success_rate: f64,
}

impl Summary {
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        let total = succeeded + failed;
        let success_rate = if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        };

        Self {
            total,
            succeeded,
            failed,
            success_rate,
        }
    }

    /// Success rate as a percentage
    pub fn success_percent(&self) -> f64 {
        self.success_rate * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let summary = Summary::from_counts(2, 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty_is_zero() {
        let summary = Summary::from_counts(0, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_summary_all_failed() {
        let summary = Summary::from_counts(0, 4);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.success_percent(), 0.0);
    }
}
