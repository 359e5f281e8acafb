//! Markdown coverage table

use std::path::Path;

use super::{format_item, is_hidden, DisplayOptions};
use crate::coverage::{CoverageEntry, CoverageModel, ReportFileSet};
use crate::paths::{pretty_path_name, relative_display_path, MAX_DISPLAY_WIDTH};

const MARKDOWN_SPECIAL: &[char] = &[
    '\\', '`', '*', '_', '{', '}', '[', ']', '(', ')', '#', '+', '-', '!', '|', '<', '>',
];

/// Backslash-escape characters Markdown would interpret
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn metric_cells(entry: &CoverageEntry) -> [String; 4] {
    [
        format_item(&entry.lines, 0),
        format_item(&entry.statements, 0),
        format_item(&entry.functions, 0),
        format_item(&entry.branches, 0),
    ]
}

fn row(label: &str, entry: &CoverageEntry) -> String {
    let mut cells = vec![label.to_string()];
    cells.extend(metric_cells(entry));
    cells.join(" | ")
}

/// Render the model as a Markdown table, file cells linking to the given commit
pub fn render_markdown(
    base_path: &Path,
    model: &CoverageModel,
    file_set: ReportFileSet,
    options: &DisplayOptions,
) -> String {
    let mut lines = vec![
        format!("## Coverage in {}", file_set.title()),
        "File | Line Coverage | Statement Coverage | Function Coverage | Branch Coverage".to_string(),
        "---- | ------------: | -----------------: | ----------------: | --------------:".to_string(),
    ];

    for displayed in model.displayed.iter().filter(|d| !is_hidden(&d.entry, options)) {
        let relative = relative_display_path(base_path, &displayed.file);
        let name = pretty_path_name(&relative, MAX_DISPLAY_WIDTH);
        let link = format!(
            "[{}](../blob/{}/{})",
            escape_markdown(&name),
            options.commit,
            escape_markdown(&relative)
        );
        lines.push(row(&link, &displayed.entry));
    }

    if model.elided_count > 0 {
        lines.push(row(&format!("Other ({} more)", model.elided_count), &model.elided));
    }
    lines.push(row("Total", &model.total));
    lines.push(String::new());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::{build_model, CoverageCollection, CoverageItem, SortMethod};

    fn entry(lines: u64, statements: u64, functions: u64, branches: u64) -> CoverageEntry {
        CoverageEntry {
            lines: CoverageItem::new(100, lines),
            statements: CoverageItem::new(100, statements),
            functions: CoverageItem::new(100, functions),
            branches: CoverageItem::new(100, branches),
            name: None,
        }
    }

    fn fixture() -> CoverageCollection {
        let mut data = CoverageCollection::new();
        data.insert("/repo/src/created-file1.ts".into(), entry(66, 100, 25, 50));
        data.insert("/repo/src/created-file2.ts".into(), entry(99, 75, 50, 25));
        data
    }

    fn options() -> DisplayOptions {
        DisplayOptions {
            commit: "master".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("src/created-file1.ts"), "src/created\\-file1.ts");
        assert_eq!(escape_markdown("a_b[1].rs"), "a\\_b\\[1\\].rs");
    }

    #[test]
    fn test_render_markdown() {
        let data = fixture();
        let files: Vec<String> = data.keys().cloned().collect();
        let model = build_model(None, files, &data, SortMethod::Alphabetically);
        let output = render_markdown(Path::new("/repo"), &model, ReportFileSet::Created, &options());

        assert_eq!(
            output,
            "## Coverage in New Files
File | Line Coverage | Statement Coverage | Function Coverage | Branch Coverage
---- | ------------: | -----------------: | ----------------: | --------------:
[src/created\\-file1.ts](../blob/master/src/created\\-file1.ts) | (66/100) 66% | (100/100) 100% | (25/100) 25% | (50/100) 50%
[src/created\\-file2.ts](../blob/master/src/created\\-file2.ts) | (99/100) 99% | (75/100) 75% | (50/100) 50% | (25/100) 25%
Total | (165/200) 83% | (175/200) 88% | (75/200) 38% | (75/200) 38%
"
        );
    }

    #[test]
    fn test_render_markdown_with_elided_row() {
        let data = fixture();
        let files: Vec<String> = data.keys().cloned().collect();
        let model = build_model(Some(1), files, &data, SortMethod::MostCoverage);
        let output = render_markdown(Path::new("/repo"), &model, ReportFileSet::All, &options());

        assert!(output.starts_with("## Coverage in All Files\n"));
        assert!(output.contains("[src/created\\-file2.ts]"));
        assert!(!output.contains("[src/created\\-file1.ts]"));
        assert!(output.contains("\nOther (1 more) | (66/100) 66% | (100/100) 100% | (25/100) 25% | (50/100) 50%\n"));
    }

    #[test]
    fn test_skip_full_rows() {
        let mut data = fixture();
        data.insert("/repo/src/done.ts".into(), entry(100, 100, 100, 100));
        let files: Vec<String> = data.keys().cloned().collect();
        let model = build_model(None, files, &data, SortMethod::Alphabetically);
        let options = DisplayOptions {
            skip_full: true,
            ..options()
        };
        let output = render_markdown(Path::new("/repo"), &model, ReportFileSet::All, &options);

        assert!(!output.contains("done.ts"));
        assert!(output.contains("Total | (265/300) 88%"));
    }

    #[test]
    fn test_long_paths_are_shortened_in_label_only() {
        let mut data = CoverageCollection::new();
        data.insert(
            "/repo/packages/server/src/handlers/upload.ts".into(),
            entry(10, 10, 10, 10),
        );
        let files: Vec<String> = data.keys().cloned().collect();
        let model = build_model(None, files, &data, SortMethod::Alphabetically);
        let output = render_markdown(Path::new("/repo"), &model, ReportFileSet::All, &options());

        assert!(output.contains(
            "[packages/../handlers/upload.ts](../blob/master/packages/server/src/handlers/upload.ts)"
        ));
    }
}
