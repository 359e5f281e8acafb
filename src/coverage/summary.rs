//! JSON summary format parser (istanbul `coverage-summary.json`)

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{percentage, read_source, CoverageCollection, CoverageEntry, CoverageItem};
use crate::error::{CoverageError, ParseError};
use crate::fs::FileSystem;

#[derive(Debug, Deserialize)]
struct SummaryEntry {
    lines: SummaryMetric,
    statements: SummaryMetric,
    functions: SummaryMetric,
    branches: SummaryMetric,
}

#[derive(Debug, Deserialize)]
struct SummaryMetric {
    total: u64,
    covered: u64,
    #[serde(default)]
    pct: Option<SummaryPct>,
}

/// istanbul writes `"Unknown"` instead of a number when a metric has no items
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SummaryPct {
    Number(f64),
    Text(String),
}

impl From<SummaryMetric> for CoverageItem {
    fn from(metric: SummaryMetric) -> Self {
        let pct = match metric.pct {
            Some(SummaryPct::Number(pct)) => pct,
            Some(SummaryPct::Text(_)) | None => percentage(metric.covered, metric.total),
        };
        CoverageItem {
            total: metric.total,
            covered: metric.covered,
            pct,
            skipped_items: None,
        }
    }
}

impl From<SummaryEntry> for CoverageEntry {
    fn from(entry: SummaryEntry) -> Self {
        CoverageEntry {
            lines: entry.lines.into(),
            functions: entry.functions.into(),
            statements: entry.statements.into(),
            branches: entry.branches.into(),
            name: None,
        }
    }
}

/// Parse a JSON summary file
pub fn parse_json_summary(fs: &dyn FileSystem, path: &Path) -> Result<CoverageCollection, CoverageError> {
    let content = read_source(fs, path)?;
    parse_json_summary_string(&content).map_err(|e| CoverageError::format(path, e))
}

/// Parse JSON summary content from a string
pub fn parse_json_summary_string(content: &str) -> Result<CoverageCollection, ParseError> {
    let document: BTreeMap<String, SummaryEntry> =
        serde_json::from_str(content).map_err(|e| ParseError::new(e.line(), e.to_string()))?;

    Ok(document
        .into_iter()
        .map(|(file, entry)| (file, entry.into()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::TOTAL_KEY;
    use crate::fs::memory::MemoryFileSystem;

    fn make_entry(file: &str, lines: u64, statements: u64, functions: u64, branches: u64) -> String {
        format!(
            r#""{}": {{
      "lines": {{ "total": 100, "covered": {}, "skipped": 0, "pct": {} }},
      "functions": {{ "total": 100, "covered": {}, "skipped": 0, "pct": {} }},
      "statements": {{ "total": 100, "covered": {}, "skipped": 0, "pct": {} }},
      "branches": {{ "total": 100, "covered": {}, "skipped": 0, "pct": {} }}
    }}"#,
            file, lines, lines, functions, functions, statements, statements, branches, branches
        )
    }

    #[test]
    fn test_parse_json_summary() {
        let json = format!(
            "{{ {}, {} }}",
            make_entry("total", 50, 50, 50, 50),
            make_entry("/repo/src/a.ts", 66, 25, 75, 10)
        );
        let data = parse_json_summary_string(&json).unwrap();

        assert_eq!(data.len(), 2);
        assert!(data.contains_key(TOTAL_KEY));
        let entry = &data["/repo/src/a.ts"];
        assert_eq!(entry.lines, CoverageItem::new(100, 66));
        assert_eq!(entry.statements.covered, 25);
        assert_eq!(entry.functions.pct, 75.0);
        assert_eq!(entry.branches.skipped(), 90);
    }

    #[test]
    fn test_pct_is_copied_verbatim() {
        let json = r#"{ "a.ts": {
            "lines": { "total": 3, "covered": 1, "skipped": 2, "pct": 33.33 },
            "statements": { "total": 0, "covered": 0, "skipped": 0, "pct": "Unknown" },
            "functions": { "total": 0, "covered": 0, "skipped": 0, "pct": 100 },
            "branches": { "total": 4, "covered": 1 }
        } }"#;
        let data = parse_json_summary_string(json).unwrap();
        let entry = &data["a.ts"];
        assert_eq!(entry.lines.pct, 33.33);
        assert_eq!(entry.statements.pct, 100.0);
        assert_eq!(entry.branches.pct, 25.0);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_json_summary_string("{}").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_document() {
        assert!(parse_json_summary_string("{").is_err());
        assert!(parse_json_summary_string(r#"{ "a.ts": { "lines": {} } }"#).is_err());
    }

    #[test]
    fn test_parse_json_summary_file() {
        let fs = MemoryFileSystem::default().with_file("coverage-summary.json", "{");
        assert!(matches!(
            parse_json_summary(&fs, Path::new("coverage-summary.json")),
            Err(CoverageError::Format { .. })
        ));
        assert!(matches!(
            parse_json_summary(&fs, Path::new("elsewhere.json")),
            Err(CoverageError::NotFound { .. })
        ));
    }
}
