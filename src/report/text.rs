//! Fixed-width text coverage table
//!
//! Columns follow the familiar istanbul text reporter: statements, branches,
//! functions and lines percentages, then the uncovered line numbers. Cells are
//! coloured by watermark when colour output is enabled.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{is_hidden, round_pct, DisplayOptions};
use crate::coverage::{CoverageEntry, CoverageItem, CoverageModel, Metric};
use crate::paths::{pretty_path_name, relative_display_path, MAX_DISPLAY_WIDTH};

const PCT_COLS: usize = 9;
const MISSING_COLS: usize = 18;
const NAME_PADDING: usize = 5;
const DELIM: &str = " |";
const COL_DELIM: &str = "-|";

/// Low/high percentage boundaries per metric
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Watermarks {
    pub statements: [f64; 2],
    pub functions: [f64; 2],
    pub branches: [f64; 2],
    pub lines: [f64; 2],
}

impl Default for Watermarks {
    fn default() -> Self {
        Self {
            statements: [50.0, 80.0],
            functions: [50.0, 80.0],
            branches: [50.0, 80.0],
            lines: [50.0, 80.0],
        }
    }
}

impl Watermarks {
    pub fn get(&self, metric: Metric) -> [f64; 2] {
        match metric {
            Metric::Statements => self.statements,
            Metric::Branches => self.branches,
            Metric::Functions => self.functions,
            Metric::Lines => self.lines,
        }
    }

    pub fn classify(&self, metric: Metric, pct: f64) -> CoverageClass {
        let [low, high] = self.get(metric);
        if pct < low {
            CoverageClass::Low
        } else if pct >= high {
            CoverageClass::High
        } else {
            CoverageClass::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageClass {
    Low,
    Medium,
    High,
}

impl CoverageClass {
    fn paint(&self, text: &str) -> ColoredString {
        match self {
            CoverageClass::Low => text.red().bold(),
            CoverageClass::Medium => text.yellow().bold(),
            CoverageClass::High => text.green().bold(),
        }
    }
}

fn colorize(text: String, class: CoverageClass, enabled: bool) -> String {
    if enabled {
        class.paint(&text).to_string()
    } else {
        text
    }
}

/// Pad `text` to `width`, indenting by `indent`; overlong text keeps its tail after `... `
fn fill(text: &str, width: usize, right: bool, indent: usize) -> String {
    let leader = " ".repeat(indent);
    let remaining = width.saturating_sub(indent);
    let chars: Vec<char> = text.chars().collect();

    let body = if remaining == 0 {
        String::new()
    } else if remaining >= chars.len() {
        let padding = " ".repeat(remaining - chars.len());
        if right {
            format!("{}{}", padding, text)
        } else {
            format!("{}{}", text, padding)
        }
    } else {
        let tail: String = chars[chars.len() - remaining..].iter().skip(4.min(remaining)).collect();
        format!("... {}", tail)
    };

    leader + &body
}

fn separator(name_width: usize) -> String {
    let pct = "-".repeat(PCT_COLS);
    let elements = [
        "-".repeat(name_width),
        pct.clone(),
        pct.clone(),
        pct.clone(),
        pct,
        "-".repeat(MISSING_COLS),
    ];
    elements.join(COL_DELIM) + COL_DELIM
}

fn header(name_width: usize) -> String {
    let elements = [
        fill("File", name_width, false, 0),
        fill("% Stmts", PCT_COLS, true, 0),
        fill("% Branch", PCT_COLS, true, 0),
        fill("% Funcs", PCT_COLS, true, 0),
        fill("% Lines", PCT_COLS, true, 0),
        fill("Uncovered Line #s", MISSING_COLS, true, 0),
    ];
    elements.join(DELIM) + DELIM
}

fn skipped_items(item: &CoverageItem) -> String {
    item.skipped_items
        .as_ref()
        .map(|items| {
            items
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .unwrap_or_default()
}

fn table_row(name: &str, entry: &CoverageEntry, name_width: usize, indent: usize, options: &DisplayOptions) -> String {
    let enabled = options.colorize && !entry.is_empty();
    let class = |metric: Metric| options.watermarks.classify(metric, entry.metric(metric).pct);
    let pct_cell = |metric: Metric| {
        colorize(
            fill(&round_pct(entry.metric(metric).pct, 2), PCT_COLS, true, 0),
            class(metric),
            enabled,
        )
    };

    // Uncovered branches are listed once every line is covered
    let missing = if entry.lines.pct == 100.0 {
        colorize(
            fill(&skipped_items(&entry.branches), MISSING_COLS, true, 0),
            CoverageClass::Medium,
            options.colorize,
        )
    } else {
        colorize(
            fill(&skipped_items(&entry.lines), MISSING_COLS, true, 0),
            CoverageClass::Low,
            options.colorize,
        )
    };

    let elements = [
        colorize(fill(name, name_width, false, indent), class(Metric::Statements), enabled),
        pct_cell(Metric::Statements),
        pct_cell(Metric::Branches),
        pct_cell(Metric::Functions),
        pct_cell(Metric::Lines),
        missing,
    ];
    elements.join(DELIM) + DELIM
}

/// Render the model as a fixed-width table
pub fn render_text(base_path: &Path, model: &CoverageModel, options: &DisplayOptions) -> String {
    let names: Vec<String> = model
        .displayed
        .iter()
        .map(|d| pretty_path_name(&relative_display_path(base_path, &d.file), MAX_DISPLAY_WIDTH))
        .collect();
    let other = format!("Other ({} more)", model.elided_count);

    let longest = names
        .iter()
        .map(|n| n.chars().count())
        .chain(std::iter::once(if model.elided_count > 0 { other.len() } else { 0 }))
        .max()
        .unwrap_or(0);
    let name_width = longest.max("Total".len()) + NAME_PADDING;

    let mut lines = vec![separator(name_width), header(name_width), separator(name_width)];

    for (name, displayed) in names.iter().zip(&model.displayed) {
        if is_hidden(&displayed.entry, options) {
            continue;
        }
        lines.push(table_row(name, &displayed.entry, name_width, 1, options));
    }

    if model.elided_count > 0 {
        lines.push(table_row(&other, &model.elided, name_width, 1, options));
    }

    lines.push(separator(name_width));
    lines.push(table_row("Total", &model.total, name_width, 0, options));
    lines.push(separator(name_width));
    lines.push(String::new());

    lines.join("\n")
}
