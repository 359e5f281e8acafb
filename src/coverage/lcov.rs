//! LCOV format parser
//!
//! A trace is a run of records, one per source file, each closed by an
//! `end_of_record` line. Lines are classified by the key before the first
//! colon; unknown keys are ignored so newer tracefile extensions still parse.

use std::path::Path;

use super::{read_source, CoverageCollection, CoverageEntry, CoverageItem};
use crate::error::{CoverageError, ParseError};
use crate::fs::FileSystem;

const END_OF_RECORD: &str = "end_of_record";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LcovToken {
    TestName,
    SourceFile,
    Function,
    FunctionHits,
    FunctionsFound,
    FunctionsHit,
    Branch,
    BranchesFound,
    BranchesHit,
    Line,
    LinesHit,
    LinesFound,
    EndOfRecord,
}

impl LcovToken {
    fn from_key(key: &str) -> Option<Self> {
        let token = match key {
            "TN" => LcovToken::TestName,
            "SF" => LcovToken::SourceFile,
            "FN" => LcovToken::Function,
            "FNDA" => LcovToken::FunctionHits,
            "FNF" => LcovToken::FunctionsFound,
            "FNH" => LcovToken::FunctionsHit,
            "BRDA" => LcovToken::Branch,
            "BRF" => LcovToken::BranchesFound,
            "BRH" => LcovToken::BranchesHit,
            "DA" => LcovToken::Line,
            "LH" => LcovToken::LinesHit,
            "LF" => LcovToken::LinesFound,
            END_OF_RECORD => LcovToken::EndOfRecord,
            _ => return None,
        };
        Some(token)
    }

    /// Number of comma separated fields the value is split into
    fn arity(&self) -> usize {
        match self {
            LcovToken::Function | LcovToken::FunctionHits => 2,
            LcovToken::Branch => 4,
            LcovToken::Line => 3,
            LcovToken::EndOfRecord => 0,
            _ => 1,
        }
    }
}

#[derive(Debug)]
struct LcovLine<'a> {
    number: usize,
    token: LcovToken,
    parts: Vec<&'a str>,
}

impl<'a> LcovLine<'a> {
    fn part(&self, index: usize, field: &str) -> Result<&'a str, ParseError> {
        self.parts
            .get(index)
            .copied()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| ParseError::new(self.number, format!("missing {}", field)))
    }

    fn count(&self, index: usize, field: &str) -> Result<u64, ParseError> {
        let raw = self.part(index, field)?;
        raw.parse::<u64>().map_err(|_| {
            ParseError::new(self.number, format!("invalid {} '{}'", field, raw))
        })
    }
}

fn tokenize(number: usize, line: &str) -> Option<LcovLine<'_>> {
    let line = line.trim();
    if line == END_OF_RECORD {
        return Some(LcovLine {
            number,
            token: LcovToken::EndOfRecord,
            parts: Vec::new(),
        });
    }

    let (key, remainder) = line.split_once(':')?;
    let token = LcovToken::from_key(key)?;

    let parts = if remainder.is_empty() {
        Vec::new()
    } else if token.arity() > 1 {
        remainder.split(',').map(str::trim).collect()
    } else {
        vec![remainder.trim()]
    };

    Some(LcovLine {
        number,
        token,
        parts,
    })
}

/// Per-record state, rebuilt from scratch after every `end_of_record`
#[derive(Debug, Default)]
struct RecordAccumulator {
    file: Option<String>,
    functions_found: Option<u64>,
    functions_hit: Option<u64>,
    branches_found: Option<u64>,
    branches_hit: Option<u64>,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
    lines_missing: Vec<u64>,
    branches_missing: Vec<u64>,
}

impl RecordAccumulator {
    fn apply(mut self, line: &LcovLine<'_>) -> Result<Self, ParseError> {
        match line.token {
            LcovToken::SourceFile => self.file = Some(line.part(0, "source file")?.to_string()),
            LcovToken::FunctionsFound => self.functions_found = Some(line.count(0, "functions found")?),
            LcovToken::FunctionsHit => self.functions_hit = Some(line.count(0, "functions hit")?),
            LcovToken::BranchesFound => self.branches_found = Some(line.count(0, "branches found")?),
            LcovToken::BranchesHit => self.branches_hit = Some(line.count(0, "branches hit")?),
            LcovToken::LinesFound => self.lines_found = Some(line.count(0, "lines found")?),
            LcovToken::LinesHit => self.lines_hit = Some(line.count(0, "lines hit")?),
            LcovToken::Line => {
                let line_number = line.count(0, "line number")?;
                if line.count(1, "line hit count")? == 0 {
                    self.lines_missing.push(line_number);
                }
            }
            LcovToken::Branch => {
                let line_number = line.count(0, "branch line number")?;
                // "-" marks a branch whose block never ran; only an explicit 0 is recorded
                let taken = line.part(3, "branch hit count")?;
                if taken != "-" && line.count(3, "branch hit count")? == 0 {
                    self.branches_missing.push(line_number);
                }
            }
            LcovToken::TestName
            | LcovToken::Function
            | LcovToken::FunctionHits
            | LcovToken::EndOfRecord => {}
        }
        Ok(self)
    }

    fn finish(self, number: usize) -> Result<(String, CoverageEntry), ParseError> {
        let missing = |field: &str| ParseError::new(number, format!("record ended without {}", field));

        let file = self.file.ok_or_else(|| missing("SF"))?;
        let functions = checked_item(
            number,
            "functions",
            self.functions_found.ok_or_else(|| missing("FNF"))?,
            self.functions_hit.ok_or_else(|| missing("FNH"))?,
        )?;
        let branches = checked_item(
            number,
            "branches",
            self.branches_found.ok_or_else(|| missing("BRF"))?,
            self.branches_hit.ok_or_else(|| missing("BRH"))?,
        )?;
        let lines = checked_item(
            number,
            "lines",
            self.lines_found.ok_or_else(|| missing("LF"))?,
            self.lines_hit.ok_or_else(|| missing("LH"))?,
        )?;

        // LCOV has no statement concept; statements mirror lines
        let lines = lines.with_skipped_items(self.lines_missing);
        let entry = CoverageEntry {
            statements: lines.clone(),
            lines,
            functions,
            branches: branches.with_skipped_items(self.branches_missing),
            name: None,
        };

        Ok((file, entry))
    }
}

fn checked_item(number: usize, metric: &str, found: u64, hit: u64) -> Result<CoverageItem, ParseError> {
    if hit > found {
        return Err(ParseError::new(
            number,
            format!("{} hit ({}) exceeds {} found ({})", metric, hit, metric, found),
        ));
    }
    Ok(CoverageItem::new(found, hit))
}

/// Parse an LCOV file
pub fn parse_lcov(fs: &dyn FileSystem, path: &Path) -> Result<CoverageCollection, CoverageError> {
    let content = read_source(fs, path)?;
    parse_lcov_string(&content).map_err(|e| CoverageError::format(path, e))
}

/// Parse LCOV content from a string
///
/// A trailing record without `end_of_record` is dropped rather than reported.
pub fn parse_lcov_string(content: &str) -> Result<CoverageCollection, ParseError> {
    let (collection, _dangling) = content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| tokenize(index + 1, line))
        .try_fold(
            (CoverageCollection::new(), RecordAccumulator::default()),
            |(mut collection, record), line| {
                if line.token == LcovToken::EndOfRecord {
                    let (file, entry) = record.finish(line.number)?;
                    collection.insert(file, entry);
                    Ok((collection, RecordAccumulator::default()))
                } else {
                    Ok((collection, record.apply(&line)?))
                }
            },
        )?;

    Ok(collection)
}
