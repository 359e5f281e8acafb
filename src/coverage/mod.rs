//! Coverage module
//!
//! Provides:
//! - The normalized coverage model and its combination arithmetic
//! - LCOV parsing
//! - JSON summary parsing
//! - Aggregation and threshold validation

mod aggregate;
mod lcov;
mod summary;
mod threshold;

pub use aggregate::*;
pub use lcov::*;
pub use summary::*;
pub use threshold::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{CoverageError, ParseError};
use crate::fs::FileSystem;

/// Key of the pre-aggregated entry some sources carry next to the files
pub const TOTAL_KEY: &str = "total";

/// Coverage entries keyed by file path (or [`TOTAL_KEY`])
pub type CoverageCollection = BTreeMap<String, CoverageEntry>;

/// Percentage of `covered` over `total`; covering no code counts as fully covered.
pub fn percentage(covered: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (covered as f64 / total as f64) * 100.0
}

/// One metric for one file or aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageItem {
    pub total: u64,
    pub covered: u64,
    pub pct: f64,
    /// Line numbers that were not hit, in source order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_items: Option<Vec<u64>>,
}

impl CoverageItem {
    pub fn new(total: u64, covered: u64) -> Self {
        Self {
            total,
            covered,
            pct: percentage(covered, total),
            skipped_items: None,
        }
    }

    pub fn with_skipped_items(mut self, items: Vec<u64>) -> Self {
        self.skipped_items = Some(items);
        self
    }

    pub fn skipped(&self) -> u64 {
        self.total.saturating_sub(self.covered)
    }
}

impl Default for CoverageItem {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// The four coverage metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Statements,
    Branches,
    Functions,
    Lines,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Statements,
        Metric::Branches,
        Metric::Functions,
        Metric::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Statements => "statements",
            Metric::Branches => "branches",
            Metric::Functions => "functions",
            Metric::Lines => "lines",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coverage of one file, the synthetic total, or an aggregate
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CoverageEntry {
    pub lines: CoverageItem,
    pub functions: CoverageItem,
    pub statements: CoverageItem,
    pub branches: CoverageItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CoverageEntry {
    pub fn metric(&self, metric: Metric) -> &CoverageItem {
        match metric {
            Metric::Statements => &self.statements,
            Metric::Branches => &self.branches,
            Metric::Functions => &self.functions,
            Metric::Lines => &self.lines,
        }
    }

    /// True when every metric reports 0%
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).pct == 0.0)
    }

    /// True when every metric reports 100%
    pub fn is_full(&self) -> bool {
        Metric::ALL.iter().all(|m| self.metric(*m).pct == 100.0)
    }
}

/// Sum two items, recomputing the percentage from the summed counts
pub fn combine_items(first: &CoverageItem, second: &CoverageItem) -> CoverageItem {
    CoverageItem::new(first.total + second.total, first.covered + second.covered)
}

pub fn combine_entries(first: &CoverageEntry, second: &CoverageEntry) -> CoverageEntry {
    CoverageEntry {
        lines: combine_items(&first.lines, &second.lines),
        functions: combine_items(&first.functions, &second.functions),
        statements: combine_items(&first.statements, &second.statements),
        branches: combine_items(&first.branches, &second.branches),
        name: None,
    }
}

/// Combine any number of entries; no entries yields an empty, fully covered entry.
pub fn reduce_entries<'a>(entries: impl IntoIterator<Item = &'a CoverageEntry>) -> CoverageEntry {
    entries
        .into_iter()
        .fold(CoverageEntry::default(), |acc, entry| combine_entries(&acc, entry))
}

/// Merge collections left to right; later sources win on the same key.
pub fn combine_collections(collections: impl IntoIterator<Item = CoverageCollection>) -> CoverageCollection {
    collections
        .into_iter()
        .fold(CoverageCollection::new(), |mut merged, collection| {
            merged.extend(collection);
            merged
        })
}

/// Format of a coverage source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum SourceType {
    #[serde(rename = "lcov")]
    Lcov,
    #[serde(rename = "json-summary")]
    JsonSummary,
}

impl SourceType {
    /// Infer the format from the file name
    pub fn infer(path: &Path) -> Self {
        let name = path.to_string_lossy();
        if name.ends_with("lcov.info") || name.ends_with(".lcov") {
            SourceType::Lcov
        } else {
            SourceType::JsonSummary
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(SourceType::Lcov),
            "json-summary" | "json" => Ok(SourceType::JsonSummary),
            _ => Err(format!(
                "Unknown coverage format: {}. Supported: lcov, json-summary",
                s
            )),
        }
    }
}

/// A coverage source with a resolved format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSource {
    pub path: PathBuf,
    pub kind: SourceType,
}

impl CoverageSource {
    pub fn new(path: impl Into<PathBuf>, kind: SourceType) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn inferred(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = SourceType::infer(&path);
        Self { path, kind }
    }
}

/// Read a coverage source, distinguishing a missing file from an unreadable one
pub fn read_source(fs: &dyn FileSystem, path: &Path) -> Result<String, CoverageError> {
    if !fs.exists(path) {
        return Err(CoverageError::NotFound {
            path: path.to_path_buf(),
        });
    }
    fs.read(path).map_err(|source| match source.kind() {
        io::ErrorKind::InvalidData => {
            CoverageError::format(path, ParseError::new(0, "content is not valid UTF-8"))
        }
        _ => CoverageError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Parse coverage from a source based on its format
pub fn parse_source(fs: &dyn FileSystem, source: &CoverageSource) -> Result<CoverageCollection, CoverageError> {
    match source.kind {
        SourceType::Lcov => parse_lcov(fs, &source.path),
        SourceType::JsonSummary => parse_json_summary(fs, &source.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(lines: (u64, u64)) -> CoverageEntry {
        CoverageEntry {
            lines: CoverageItem::new(lines.0, lines.1),
            statements: CoverageItem::new(lines.0, lines.1),
            ..Default::default()
        }
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 100.0);
        assert_eq!(percentage(15, 20), 75.0);
        assert_eq!(percentage(0, 10), 0.0);
    }

    #[test]
    fn test_item_skipped_is_derived() {
        let item = CoverageItem::new(20, 15).with_skipped_items(vec![3, 7]);
        assert_eq!(item.skipped(), 5);
        assert_eq!(item.pct, 75.0);
        assert_eq!(item.skipped_items, Some(vec![3, 7]));
    }

    #[test]
    fn test_combine_is_weighted_by_total() {
        let small = CoverageItem::new(10, 0);
        let large = CoverageItem::new(90, 90);
        let combined = combine_items(&small, &large);
        assert_eq!(combined.total, 100);
        assert_eq!(combined.covered, 90);
        // A naive mean of percentages would give 50%
        assert_eq!(combined.pct, 90.0);
    }

    #[test]
    fn test_combine_empty_items_is_fully_covered() {
        let combined = combine_items(&CoverageItem::new(0, 0), &CoverageItem::new(0, 0));
        assert_eq!(combined.pct, 100.0);
    }

    #[test]
    fn test_combine_entries_is_commutative() {
        let a = entry((100, 66));
        let b = entry((100, 99));
        let ab = combine_entries(&a, &b);
        assert_eq!(ab, combine_entries(&b, &a));
        assert_eq!(ab.lines.covered, 165);
        assert_eq!(ab.lines.total, 200);
        assert_eq!(ab.lines.pct, 82.5);
    }

    #[test]
    fn test_combine_entries_is_associative() {
        let a = entry((10, 3));
        let b = entry((7, 7));
        let c = entry((0, 0));
        assert_eq!(
            combine_entries(&combine_entries(&a, &b), &c),
            combine_entries(&a, &combine_entries(&b, &c))
        );
    }

    #[test]
    fn test_non_utf8_source_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcov.info");
        std::fs::write(&path, [b'S', b'F', b':', 0xff, 0xfe, b'\n']).unwrap();

        let err = read_source(&crate::fs::LocalFileSystem, &path).unwrap_err();
        assert!(matches!(err, CoverageError::Format { .. }));
        assert!(err.to_string().contains("invalid formatting"));
    }

    #[test]
    fn test_reduce_no_entries() {
        let total = reduce_entries(std::iter::empty());
        assert_eq!(total.lines.total, 0);
        assert_eq!(total.lines.pct, 100.0);
    }

    #[test]
    fn test_combine_collections_last_writer_wins() {
        let mut first = CoverageCollection::new();
        first.insert("a.rs".to_string(), entry((10, 1)));
        first.insert("b.rs".to_string(), entry((10, 2)));
        let mut second = CoverageCollection::new();
        second.insert("b.rs".to_string(), entry((10, 9)));

        let merged = combine_collections(vec![first, second]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["a.rs"].lines.covered, 1);
        assert_eq!(merged["b.rs"].lines.covered, 9);
    }

    #[test]
    fn test_entry_empty_and_full() {
        assert!(CoverageEntry::default().is_full());

        let empty = CoverageEntry {
            lines: CoverageItem::new(4, 0),
            statements: CoverageItem::new(4, 0),
            functions: CoverageItem::new(1, 0),
            branches: CoverageItem::new(2, 0),
            name: None,
        };
        assert!(empty.is_empty());
        assert!(!empty.is_full());
    }

    #[test]
    fn test_infer_source_type() {
        assert_eq!(SourceType::infer(Path::new("coverage/lcov.info")), SourceType::Lcov);
        assert_eq!(SourceType::infer(Path::new("target/app.lcov")), SourceType::Lcov);
        assert_eq!(
            SourceType::infer(Path::new("coverage/coverage-summary.json")),
            SourceType::JsonSummary
        );
        assert_eq!("LCOV".parse::<SourceType>(), Ok(SourceType::Lcov));
        assert!("cobertura".parse::<SourceType>().is_err());
    }
}
