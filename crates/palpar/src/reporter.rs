//! Test reporting: pass/fail per scenario plus a failure category.
//!
//! The category distinguishes environment breakage (server down, session
//! lost) from genuine product regressions (assertion false) and from missing
//! UI elements, so a red run can be triaged without reading logs.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::result::{FailureCategory, PalparError};

/// Scenario outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    /// Scenario passed
    Passed,
    /// Scenario failed
    Failed,
    /// Scenario did not run
    Skipped,
}

impl TestStatus {
    /// Check if status is passing.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Outcome of one scenario execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Pass/fail status
    pub status: TestStatus,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Failure message, verbatim
    pub message: Option<String>,
    /// Failure classification
    pub category: Option<FailureCategory>,
}

impl ScenarioReport {
    /// A passing report.
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Passed,
            duration,
            message: None,
            category: None,
        }
    }

    /// A failing report derived from the terminating error.
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, error: &PalparError) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            duration,
            message: Some(error.to_string()),
            category: Some(error.category()),
        }
    }

    /// Whether the scenario passed.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        self.status.is_passed()
    }

    /// Whether the failure was caused by the environment rather than the
    /// application under test.
    #[must_use]
    pub fn is_infrastructure_failure(&self) -> bool {
        self.category == Some(FailureCategory::Infrastructure)
    }

    /// Log this report at the appropriate level.
    pub fn emit(&self) {
        match self.status {
            TestStatus::Passed => {
                info!(scenario = %self.name, duration_ms = self.duration.as_millis() as u64, "PASSED");
            }
            TestStatus::Failed => {
                error!(
                    scenario = %self.name,
                    duration_ms = self.duration.as_millis() as u64,
                    category = %self.category.map(|c| c.to_string()).unwrap_or_default(),
                    message = %self.message.as_deref().unwrap_or(""),
                    "FAILED"
                );
            }
            TestStatus::Skipped => {
                info!(scenario = %self.name, "SKIPPED");
            }
        }
    }
}

/// Collects scenario reports for a run.
#[derive(Debug, Default)]
pub struct Reporter {
    reports: Vec<ScenarioReport>,
}

impl Reporter {
    /// Create an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report, emitting it to the log.
    pub fn record(&mut self, report: ScenarioReport) {
        report.emit();
        self.reports.push(report);
    }

    /// All recorded reports, in order.
    #[must_use]
    pub fn reports(&self) -> &[ScenarioReport] {
        &self.reports
    }

    /// Number of passed scenarios.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.is_passed()).count()
    }

    /// Number of failed scenarios.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == TestStatus::Failed)
            .count()
    }

    /// Whether every recorded scenario passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(ScenarioReport::is_passed)
    }

    /// One-line summary for the run.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed of {}",
            self.passed_count(),
            self.failed_count(),
            self.reports.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passed_report() {
        let report = ScenarioReport::passed("swaglabs_login", Duration::from_millis(1500));
        assert!(report.is_passed());
        assert!(report.message.is_none());
        assert!(report.category.is_none());
    }

    #[test]
    fn test_failed_report_carries_category() {
        let err = PalparError::assertion("Login failed or inventory screen not found");
        let report = ScenarioReport::failed("swaglabs_login", Duration::from_secs(3), &err);
        assert!(!report.is_passed());
        assert_eq!(report.category, Some(FailureCategory::Assertion));
        assert!(report
            .message
            .as_deref()
            .unwrap()
            .contains("Login failed or inventory screen not found"));
    }

    #[test]
    fn test_infrastructure_failure_distinguishable() {
        let err = PalparError::ServerUnreachable {
            endpoint: "http://127.0.0.1:4723".to_string(),
            message: "connection refused".to_string(),
        };
        let report = ScenarioReport::failed("swaglabs_login", Duration::ZERO, &err);
        assert!(report.is_infrastructure_failure());

        let assertion = ScenarioReport::failed(
            "swaglabs_login",
            Duration::ZERO,
            &PalparError::assertion("nope"),
        );
        assert!(!assertion.is_infrastructure_failure());
    }

    #[test]
    fn test_reporter_summary() {
        let mut reporter = Reporter::new();
        reporter.record(ScenarioReport::passed("a", Duration::ZERO));
        reporter.record(ScenarioReport::failed(
            "b",
            Duration::ZERO,
            &PalparError::assertion("failed"),
        ));
        assert_eq!(reporter.passed_count(), 1);
        assert_eq!(reporter.failed_count(), 1);
        assert!(!reporter.all_passed());
        assert_eq!(reporter.summary(), "1 passed, 1 failed of 2");
    }
}
