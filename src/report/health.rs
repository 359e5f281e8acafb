//! Coverage health message

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::coverage::{meets_threshold, CoverageEntry, CoverageThreshold, ReportFileSet};

/// How a threshold miss is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Report a miss as a warning
    Warn,
    /// Report a miss as an error and fail the run
    Fail,
    /// Always report as a plain message
    #[default]
    Message,
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" => Ok(ReportMode::Warn),
            "fail" => Ok(ReportMode::Fail),
            "message" => Ok(ReportMode::Message),
            _ => Err(format!("Unknown report mode: {}. Supported: warn, fail, message", s)),
        }
    }
}

/// Channel a piece of output is emitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Caller-supplied replacements for the default health text
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomMessages {
    pub success: Option<String>,
    pub failure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthMessage {
    pub passed: bool,
    pub severity: Severity,
    pub text: String,
}

/// Compare the total against the threshold and pick the message to emit
pub fn coverage_health(
    total: &CoverageEntry,
    threshold: &CoverageThreshold,
    file_set: ReportFileSet,
    mode: ReportMode,
    messages: &CustomMessages,
) -> HealthMessage {
    let passed = meets_threshold(total, threshold);

    let text = if passed {
        messages
            .success
            .clone()
            .unwrap_or_else(|| format!("Test coverage is looking good for {}", file_set.description()))
    } else {
        messages
            .failure
            .clone()
            .unwrap_or_else(|| format!("Hmmm, code coverage is looking low for {}.", file_set.description()))
    };

    let severity = match (passed, mode) {
        (false, ReportMode::Warn) => Severity::Warning,
        (false, ReportMode::Fail) => Severity::Error,
        _ => Severity::Info,
    };

    HealthMessage {
        passed,
        severity,
        text,
    }
}
