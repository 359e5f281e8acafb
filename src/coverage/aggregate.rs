//! File selection, ranking and roll-up of coverage entries

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::{reduce_entries, CoverageCollection, CoverageEntry, CoverageItem, TOTAL_KEY};

/// Which files a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ReportFileSet {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "modified")]
    Modified,
    #[serde(rename = "createdOrModified", alias = "created-or-modified")]
    CreatedOrModified,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl ReportFileSet {
    /// Heading used for the report table
    pub fn title(&self) -> &'static str {
        match self {
            ReportFileSet::Created => "New Files",
            ReportFileSet::Modified => "Modified Files",
            ReportFileSet::CreatedOrModified => "Created or Modified Files",
            ReportFileSet::All => "All Files",
        }
    }

    /// Phrase used in the coverage health message
    pub fn description(&self) -> &'static str {
        match self {
            ReportFileSet::Created => "the new files in this PR",
            ReportFileSet::Modified => "the modified files in this PR",
            ReportFileSet::CreatedOrModified => "the modified or changed files in this PR",
            ReportFileSet::All => "the whole codebase",
        }
    }
}

impl FromStr for ReportFileSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ReportFileSet::Created),
            "modified" => Ok(ReportFileSet::Modified),
            "createdOrModified" | "created-or-modified" => Ok(ReportFileSet::CreatedOrModified),
            "all" => Ok(ReportFileSet::All),
            _ => Err(format!(
                "Unknown file set: {}. Supported: created, modified, createdOrModified, all",
                s
            )),
        }
    }
}

/// Order of the displayed files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMethod {
    #[default]
    #[serde(alias = "alphabetical")]
    Alphabetically,
    LeastCoverage,
    MostCoverage,
    LargestFileSize,
    SmallestFileSize,
    #[serde(alias = "most-uncovered-lines")]
    UncoveredLines,
}

impl FromStr for SortMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alphabetically" | "alphabetical" => Ok(SortMethod::Alphabetically),
            "least-coverage" => Ok(SortMethod::LeastCoverage),
            "most-coverage" => Ok(SortMethod::MostCoverage),
            "largest-file-size" => Ok(SortMethod::LargestFileSize),
            "smallest-file-size" => Ok(SortMethod::SmallestFileSize),
            "uncovered-lines" | "most-uncovered-lines" => Ok(SortMethod::UncoveredLines),
            _ => Err(format!(
                "Unknown sort method: {}. Supported: alphabetically, least-coverage, most-coverage, \
                 largest-file-size, smallest-file-size, uncovered-lines",
                s
            )),
        }
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortMethod::Alphabetically => "alphabetically",
            SortMethod::LeastCoverage => "least-coverage",
            SortMethod::MostCoverage => "most-coverage",
            SortMethod::LargestFileSize => "largest-file-size",
            SortMethod::SmallestFileSize => "smallest-file-size",
            SortMethod::UncoveredLines => "uncovered-lines",
        };
        f.write_str(name)
    }
}

/// A displayed file and its coverage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    pub file: String,
    #[serde(flatten)]
    pub entry: CoverageEntry,
}

/// Result of aggregating a file selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageModel {
    /// Every selected file combined
    pub total: CoverageEntry,
    /// Files shown, in sort order
    pub displayed: Vec<FileEntry>,
    /// Number of selected files cut by the display cap
    pub elided_count: usize,
    /// The cut files combined
    pub elided: CoverageEntry,
}

/// Every file in the collection except the pre-aggregated total
pub fn all_files(collection: &CoverageCollection) -> Vec<String> {
    collection
        .keys()
        .filter(|file| file.as_str() != TOTAL_KEY)
        .cloned()
        .collect()
}

/// Resolve changed paths against the repository root, keeping those with coverage
///
/// A path matches when either its resolved form or the path as given is a key
/// of the collection, so absolute and root-relative sources both work.
pub fn covered_files(root: &Path, files: &[String], collection: &CoverageCollection) -> Vec<String> {
    files
        .iter()
        .filter_map(|file| {
            let resolved = root.join(file).to_string_lossy().into_owned();
            if collection.contains_key(&resolved) {
                Some(resolved)
            } else if collection.contains_key(file) {
                Some(file.clone())
            } else {
                None
            }
        })
        .collect()
}

/// Pick the working file set
pub fn select_file_set(
    mode: ReportFileSet,
    all: &[String],
    modified: &[String],
    created: &[String],
) -> Vec<String> {
    match mode {
        ReportFileSet::All => all.to_vec(),
        ReportFileSet::Modified => modified.to_vec(),
        ReportFileSet::Created => created.to_vec(),
        ReportFileSet::CreatedOrModified => {
            let mut seen = HashSet::new();
            created
                .iter()
                .chain(modified)
                .filter(|file| seen.insert(file.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Case-insensitive ordering with a byte-wise tie break
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Sort files; numeric methods key on the `lines` metric
pub fn sort_files(mut files: Vec<String>, collection: &CoverageCollection, method: SortMethod) -> Vec<String> {
    let missing = CoverageItem::default();
    let lines = |file: &String| collection.get(file).map_or(&missing, |entry| &entry.lines);

    match method {
        SortMethod::Alphabetically => files.sort_by(|a, b| compare_names(a, b)),
        SortMethod::LeastCoverage => files.sort_by(|a, b| lines(a).pct.total_cmp(&lines(b).pct)),
        SortMethod::MostCoverage => files.sort_by(|a, b| lines(b).pct.total_cmp(&lines(a).pct)),
        SortMethod::LargestFileSize => files.sort_by_key(|file| std::cmp::Reverse(lines(file).total)),
        SortMethod::SmallestFileSize => files.sort_by_key(|file| lines(file).total),
        SortMethod::UncoveredLines => files.sort_by_key(|file| std::cmp::Reverse(lines(file).skipped())),
    }

    files
}

/// Sort, truncate to `max_entries` and roll up totals
pub fn build_model(
    max_entries: Option<usize>,
    files: Vec<String>,
    collection: &CoverageCollection,
    sort_method: SortMethod,
) -> CoverageModel {
    let sorted = sort_files(files, collection, sort_method);
    let cap = max_entries.unwrap_or(usize::MAX).min(sorted.len());
    let (shown, cut) = sorted.split_at(cap);

    let displayed: Vec<FileEntry> = shown
        .iter()
        .filter_map(|file| {
            collection.get(file).map(|entry| FileEntry {
                file: file.clone(),
                entry: entry.clone(),
            })
        })
        .collect();

    let elided_entries: Vec<&CoverageEntry> = cut.iter().filter_map(|file| collection.get(file)).collect();
    let elided = reduce_entries(elided_entries.iter().copied());
    let total = reduce_entries(displayed.iter().map(|d| &d.entry).chain(elided_entries.iter().copied()));

    CoverageModel {
        total,
        displayed,
        elided_count: elided_entries.len(),
        elided,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(total: u64, covered: u64) -> CoverageEntry {
        CoverageEntry {
            lines: CoverageItem::new(total, covered),
            statements: CoverageItem::new(total, covered),
            functions: CoverageItem::new(total, covered),
            branches: CoverageItem::new(total, covered),
            name: None,
        }
    }

    fn collection(files: &[(&str, u64, u64)]) -> CoverageCollection {
        files
            .iter()
            .map(|(name, total, covered)| (name.to_string(), entry(*total, *covered)))
            .collect()
    }

    fn names(files: &[&str]) -> Vec<String> {
        files.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_all_files_skips_total() {
        let data = collection(&[("total", 10, 5), ("b.ts", 10, 5), ("a.ts", 10, 5)]);
        assert_eq!(all_files(&data), names(&["a.ts", "b.ts"]));
    }

    #[test]
    fn test_covered_files() {
        let data = collection(&[("/repo/src/a.ts", 10, 5), ("src/b.ts", 10, 5)]);
        let changed = names(&["src/a.ts", "src/b.ts", "README.md"]);
        assert_eq!(
            covered_files(&PathBuf::from("/repo"), &changed, &data),
            names(&["/repo/src/a.ts", "src/b.ts"])
        );
    }

    #[test]
    fn test_select_file_set() {
        let all = names(&["a", "b", "c", "d"]);
        let modified = names(&["b", "c"]);
        let created = names(&["c", "d"]);

        assert_eq!(select_file_set(ReportFileSet::All, &all, &modified, &created), all);
        assert_eq!(select_file_set(ReportFileSet::Modified, &all, &modified, &created), modified);
        assert_eq!(select_file_set(ReportFileSet::Created, &all, &modified, &created), created);
        assert_eq!(
            select_file_set(ReportFileSet::CreatedOrModified, &all, &modified, &created),
            names(&["c", "d", "b"])
        );
    }

    #[test]
    fn test_sort_alphabetically() {
        let data = collection(&[]);
        let sorted = sort_files(names(&["b.ts", "C.ts", "a.ts"]), &data, SortMethod::Alphabetically);
        assert_eq!(sorted, names(&["a.ts", "b.ts", "C.ts"]));
        assert_eq!(sort_files(sorted.clone(), &data, SortMethod::Alphabetically), sorted);
    }

    #[test]
    fn test_sort_by_coverage_keys() {
        let data = collection(&[("small", 10, 9), ("large", 200, 20), ("mid", 50, 40)]);
        let files = names(&["small", "large", "mid"]);

        assert_eq!(
            sort_files(files.clone(), &data, SortMethod::LeastCoverage),
            names(&["large", "mid", "small"])
        );
        assert_eq!(
            sort_files(files.clone(), &data, SortMethod::MostCoverage),
            names(&["small", "mid", "large"])
        );
        assert_eq!(
            sort_files(files.clone(), &data, SortMethod::LargestFileSize),
            names(&["large", "mid", "small"])
        );
        assert_eq!(
            sort_files(files.clone(), &data, SortMethod::SmallestFileSize),
            names(&["small", "mid", "large"])
        );
        assert_eq!(
            sort_files(files, &data, SortMethod::UncoveredLines),
            names(&["large", "mid", "small"])
        );
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let data = collection(&[("x", 10, 5), ("y", 10, 5), ("z", 10, 5)]);
        let files = names(&["z", "x", "y"]);
        assert_eq!(sort_files(files.clone(), &data, SortMethod::LeastCoverage), files);
        assert_eq!(sort_files(files.clone(), &data, SortMethod::MostCoverage), files);
    }

    #[test]
    fn test_build_model_totals() {
        let data = collection(&[("a", 100, 66), ("b", 100, 99)]);
        let model = build_model(None, names(&["b", "a"]), &data, SortMethod::Alphabetically);

        assert_eq!(model.displayed.len(), 2);
        assert_eq!(model.displayed[0].file, "a");
        assert_eq!(model.elided_count, 0);
        assert_eq!(model.total.lines.covered, 165);
        assert_eq!(model.total.lines.total, 200);
        assert_eq!(model.total.lines.pct, 82.5);
    }

    #[test]
    fn test_build_model_truncates() {
        let data = collection(&[
            ("a", 100, 66),
            ("b", 100, 99),
            ("c", 100, 66),
            ("d", 100, 99),
            ("e", 100, 25),
        ]);
        let files = all_files(&data);
        let model = build_model(Some(3), files, &data, SortMethod::Alphabetically);

        let shown: Vec<&str> = model.displayed.iter().map(|d| d.file.as_str()).collect();
        assert_eq!(shown, vec!["a", "b", "c"]);
        assert_eq!(model.elided_count, 2);
        assert_eq!(model.elided.lines.covered, 124);
        assert_eq!(model.elided.lines.total, 200);
        assert_eq!(model.elided.lines.pct, 62.0);
        assert_eq!(model.total.lines.covered, 355);
        assert_eq!(model.total.lines.total, 500);
    }

    #[test]
    fn test_build_model_empty_selection() {
        let model = build_model(Some(3), Vec::new(), &collection(&[]), SortMethod::MostCoverage);
        assert!(model.displayed.is_empty());
        assert_eq!(model.total.lines.pct, 100.0);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("createdOrModified".parse::<ReportFileSet>(), Ok(ReportFileSet::CreatedOrModified));
        assert_eq!("most-uncovered-lines".parse::<SortMethod>(), Ok(SortMethod::UncoveredLines));
        assert!("newest".parse::<SortMethod>().is_err());
        assert_eq!(SortMethod::LargestFileSize.to_string(), "largest-file-size");
    }
}
