//! Report module
//!
//! Provides:
//! - Markdown table rendering
//! - Fixed-width text table rendering with watermark colours
//! - JSON output of the coverage model
//! - Coverage health messages

mod health;
mod markdown;
mod text;

pub use health::*;
pub use markdown::*;
pub use text::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::coverage::{CoverageEntry, CoverageItem, CoverageModel, ReportFileSet};

/// Output format of the coverage table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}. Supported: markdown, text, json", s)),
        }
    }
}

/// Rendering options that do not change the aggregated numbers
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    pub format: ReportFormat,
    /// Revision used in Markdown file links
    pub commit: String,
    pub colorize: bool,
    pub skip_empty: bool,
    pub skip_full: bool,
    pub watermarks: Watermarks,
}

/// Render the coverage table for a model
pub fn render(
    base_path: &Path,
    model: &CoverageModel,
    file_set: ReportFileSet,
    options: &DisplayOptions,
) -> anyhow::Result<String> {
    let output = match options.format {
        ReportFormat::Markdown => render_markdown(base_path, model, file_set, options),
        ReportFormat::Text => render_text(base_path, model, options),
        ReportFormat::Json => serde_json::to_string_pretty(model)? + "\n",
    };
    Ok(output)
}

/// Round half away from zero, so 82.5 shows as 83
pub fn round_pct(pct: f64, precision: usize) -> String {
    let factor = 10f64.powi(precision as i32);
    format!("{:.*}", precision, (pct * factor).round() / factor)
}

/// `(covered/total) pct%`
pub fn format_item(item: &CoverageItem, precision: usize) -> String {
    format!(
        "({}/{}) {}%",
        item.covered,
        item.total,
        round_pct(item.pct, precision)
    )
}

/// Apply `skip_empty` / `skip_full` to a displayed entry
pub(crate) fn is_hidden(entry: &CoverageEntry, options: &DisplayOptions) -> bool {
    (options.skip_empty && entry.is_empty()) || (options.skip_full && entry.is_full())
}
