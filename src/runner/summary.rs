use serde::Serialize;
use std::fmt;

/// Counters for one finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success: bool,
}

impl RunSummary {
    pub(crate) fn new(total: usize, passed: usize, failed: usize, skipped: usize) -> Self {
        Self {
            total,
            passed,
            failed,
            skipped,
            success: failed == 0,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.success
    }

    /// Percentage of executed tests that passed.
    pub fn success_rate(&self) -> f64 {
        let executed = self.passed + self.failed;
        if executed == 0 {
            return 0.0;
        }
        (self.passed as f64 / executed as f64) * 100.0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "All {} tests ran successfully.", self.total - self.skipped)?;
        } else {
            write!(f, "{} out of {} tests failed.", self.failed, self.total - self.skipped)?;
        }
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_console_wording() {
        assert_eq!(RunSummary::new(3, 3, 0, 0).to_string(), "All 3 tests ran successfully.");
        assert_eq!(
            RunSummary::new(5, 0, 1, 4).to_string(),
            "1 out of 1 tests failed. (4 skipped)"
        );
    }

    #[test]
    fn success_rate_ignores_skipped() {
        let summary = RunSummary::new(4, 1, 1, 2);
        assert!(summary.has_failures());
        assert!((summary.success_rate() - 50.0).abs() < f64::EPSILON);
        assert_eq!(RunSummary::default().success_rate(), 0.0);
    }
}
