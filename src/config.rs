use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::coverage::{CoverageSource, CoverageThreshold, Metric, ReportFileSet, SortMethod, SourceType};
use crate::report::{CustomMessages, ReportFormat, ReportMode, Watermarks};

pub const DEFAULT_COVERAGE_PATH: &str = "./coverage/coverage-summary.json";

/// A coverage source as written in the config file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourcePath {
    Inferred(PathBuf),
    Explicit {
        path: PathBuf,
        #[serde(rename = "type")]
        kind: SourceType,
    },
}

impl SourcePath {
    pub fn resolve(&self, base_dir: &Path) -> CoverageSource {
        match self {
            SourcePath::Inferred(path) => CoverageSource::inferred(base_dir.join(path)),
            SourcePath::Explicit { path, kind } => CoverageSource::new(base_dir.join(path), *kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coverage sources, merged left to right
    pub sources: Vec<SourcePath>,
    pub file_set: ReportFileSet,
    pub sort: SortMethod,
    /// Files shown before the rest is rolled into one row
    pub max_entries: Option<usize>,
    pub threshold: CoverageThreshold,
    pub mode: ReportMode,
    pub success_message: Option<String>,
    pub failure_message: Option<String>,
    pub format: ReportFormat,
    /// Ref the branch is compared against when finding created/modified files
    pub base: Option<String>,
    /// Hide files with 0% on every metric
    pub skip_empty: bool,
    /// Hide files with 100% on every metric
    pub skip_full: bool,
    pub watermarks: Watermarks,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            file_set: ReportFileSet::default(),
            sort: SortMethod::default(),
            max_entries: None,
            threshold: CoverageThreshold::default(),
            mode: ReportMode::default(),
            success_message: None,
            failure_message: None,
            format: ReportFormat::default(),
            base: None,
            skip_empty: false,
            skip_full: false,
            watermarks: Watermarks::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for metric in Metric::ALL {
            let floor = self.threshold.floor(metric);
            if !(0.0..=100.0).contains(&floor) {
                anyhow::bail!("Threshold for {} must be between 0 and 100, got {}", metric, floor);
            }

            let [low, high] = self.watermarks.get(metric);
            if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low > high {
                anyhow::bail!(
                    "Watermarks for {} must be two percentages in ascending order, got [{}, {}]",
                    metric,
                    low,
                    high
                );
            }
        }

        if self.max_entries == Some(0) {
            anyhow::bail!("max_entries must be at least 1");
        }

        Ok(())
    }

    /// Sources with their formats resolved; the default summary path when none are configured
    pub fn coverage_sources(&self, base_dir: &Path) -> Vec<CoverageSource> {
        if self.sources.is_empty() {
            return vec![CoverageSource::inferred(base_dir.join(DEFAULT_COVERAGE_PATH))];
        }
        self.sources.iter().map(|s| s.resolve(base_dir)).collect()
    }

    pub fn custom_messages(&self) -> CustomMessages {
        CustomMessages {
            success: self.success_message.clone(),
            failure: self.failure_message.clone(),
        }
    }
}
