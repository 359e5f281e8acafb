//! Coverage threshold validation

use colored::Colorize;
use serde::{Deserialize, Serialize};

use super::{CoverageEntry, Metric};

/// Minimum percentage required for each metric
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoverageThreshold {
    pub statements: f64,
    pub branches: f64,
    pub functions: f64,
    pub lines: f64,
}

impl CoverageThreshold {
    pub fn uniform(pct: f64) -> Self {
        Self {
            statements: pct,
            branches: pct,
            functions: pct,
            lines: pct,
        }
    }

    pub fn floor(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Statements => self.statements,
            Metric::Branches => self.branches,
            Metric::Functions => self.functions,
            Metric::Lines => self.lines,
        }
    }
}

impl Default for CoverageThreshold {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

/// True when every metric reaches its floor
pub fn meets_threshold(entry: &CoverageEntry, threshold: &CoverageThreshold) -> bool {
    Metric::ALL
        .iter()
        .all(|metric| entry.metric(*metric).pct >= threshold.floor(*metric))
}

/// Outcome of checking one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCheck {
    pub metric: Metric,
    pub coverage: f64,
    pub threshold: f64,
    pub delta: f64,
    pub passed: bool,
}

/// Result of threshold validation
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    pub passed: bool,
    pub checks: Vec<MetricCheck>,
}

impl ThresholdResult {
    /// One line per metric, e.g. `✓ lines coverage: 82.5% (threshold: 50.0%, +32.5%)`
    pub fn summary_lines(&self, colorize: bool) -> Vec<String> {
        self.checks
            .iter()
            .map(|check| {
                let (status, delta_str) = if check.passed {
                    ("✓", format!("+{:.1}%", check.delta))
                } else {
                    ("✗", format!("{:.1}%", check.delta))
                };
                let (status, delta_str) = match (colorize, check.passed) {
                    (false, _) => (status.to_string(), delta_str),
                    (true, true) => (status.green().to_string(), delta_str.green().to_string()),
                    (true, false) => (status.red().to_string(), delta_str.red().to_string()),
                };

                format!(
                    "  {} {} coverage: {:.1}% (threshold: {:.1}%, {})",
                    status, check.metric, check.coverage, check.threshold, delta_str
                )
            })
            .collect()
    }
}

/// Validate an entry against thresholds, metric by metric
pub fn validate_threshold(entry: &CoverageEntry, threshold: &CoverageThreshold) -> ThresholdResult {
    let checks: Vec<MetricCheck> = Metric::ALL
        .iter()
        .map(|metric| {
            let coverage = entry.metric(*metric).pct;
            let floor = threshold.floor(*metric);
            MetricCheck {
                metric: *metric,
                coverage,
                threshold: floor,
                delta: coverage - floor,
                passed: coverage >= floor,
            }
        })
        .collect();

    ThresholdResult {
        passed: checks.iter().all(|check| check.passed),
        checks,
    }
}
