//! Coverage report orchestration
//!
//! Loads every coverage source, asks version control which files changed,
//! aggregates the selected files and emits the table plus a health message.
//! A broken or missing coverage source is downgraded to a warning so it never
//! aborts the host run.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::coverage::{
    all_files, build_model, combine_collections, covered_files, parse_source, select_file_set,
    validate_threshold, CoverageCollection, CoverageSource, ReportFileSet,
};
use crate::error::CoverageError;
use crate::fs::FileSystem;
use crate::git::VersionControl;
use crate::report::{coverage_health, render, DisplayOptions, Severity};

/// Destination for report output
pub trait Sink {
    fn emit(&mut self, severity: Severity, text: &str);
}

/// Writes info to stdout, warnings and errors to stderr
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn emit(&mut self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => println!("{}", text),
            Severity::Warning => eprintln!("{} {}", "Warning:".yellow().bold(), text),
            Severity::Error => eprintln!("{} {}", "Error:".red().bold(), text),
        }
    }
}

/// What a report run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// No table was emitted: a source failed to load or no file was selected
    Skipped,
    /// A table and health message were emitted
    Reported { passed: bool, severity: Severity },
}

impl ReportOutcome {
    /// True when the run should fail the host build
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ReportOutcome::Reported {
                severity: Severity::Error,
                ..
            }
        )
    }
}

pub struct Reporter<'a> {
    fs: &'a dyn FileSystem,
    vcs: &'a dyn VersionControl,
}

impl<'a> Reporter<'a> {
    pub fn new(fs: &'a dyn FileSystem, vcs: &'a dyn VersionControl) -> Self {
        Self { fs, vcs }
    }

    /// Parse every source and merge them; later sources win on the same file
    pub fn load_coverage(&self, sources: &[CoverageSource]) -> Result<CoverageCollection, CoverageError> {
        let collections = sources
            .iter()
            .map(|source| {
                let collection = parse_source(self.fs, source)?;
                log::debug!(
                    "Parsed {} entries from {} ({:?})",
                    collection.len(),
                    source.path.display(),
                    source.kind
                );
                Ok(collection)
            })
            .collect::<Result<Vec<_>, CoverageError>>()?;

        Ok(combine_collections(collections))
    }

    /// Changed files of one kind that have coverage; lookup failures count as no changes
    fn changed_files(&self, kind: &str, files: Result<Vec<String>>, coverage: &CoverageCollection) -> Vec<String> {
        match files {
            Ok(files) => covered_files(&self.vcs.root_directory(), &files, coverage),
            Err(e) => {
                log::warn!("Could not list {} files: {:#}", kind, e);
                Vec::new()
            }
        }
    }

    fn select_files(&self, file_set: ReportFileSet, coverage: &CoverageCollection) -> Vec<String> {
        let wants_modified = matches!(file_set, ReportFileSet::Modified | ReportFileSet::CreatedOrModified);
        let wants_created = matches!(file_set, ReportFileSet::Created | ReportFileSet::CreatedOrModified);

        let modified = if wants_modified {
            self.changed_files("modified", self.vcs.modified_files(), coverage)
        } else {
            Vec::new()
        };
        let created = if wants_created {
            self.changed_files("created", self.vcs.created_files(), coverage)
        } else {
            Vec::new()
        };

        select_file_set(file_set, &all_files(coverage), &modified, &created)
    }

    /// Run one report
    pub fn run(
        &self,
        config: &Config,
        sources: &[CoverageSource],
        colorize: bool,
        sink: &mut dyn Sink,
    ) -> Result<ReportOutcome> {
        let coverage = match self.load_coverage(sources) {
            Ok(coverage) => coverage,
            Err(e) => {
                log::debug!("Skipping report: {:?}", e);
                sink.emit(Severity::Warning, &e.to_string());
                return Ok(ReportOutcome::Skipped);
            }
        };

        let files = self.select_files(config.file_set, &coverage);
        if files.is_empty() {
            log::debug!("No files with coverage in {}", config.file_set.description());
            return Ok(ReportOutcome::Skipped);
        }

        let root = self.vcs.root_directory();
        let model = build_model(config.max_entries, files, &coverage, config.sort);

        let options = DisplayOptions {
            format: config.format,
            commit: self.vcs.current_commit(),
            colorize,
            skip_empty: config.skip_empty,
            skip_full: config.skip_full,
            watermarks: config.watermarks,
        };
        let table = render(&root, &model, config.file_set, &options)?;
        sink.emit(Severity::Info, &table);

        for line in validate_threshold(&model.total, &config.threshold).summary_lines(false) {
            log::debug!("{}", line);
        }

        let health = coverage_health(
            &model.total,
            &config.threshold,
            config.file_set,
            config.mode,
            &config.custom_messages(),
        );
        sink.emit(health.severity, &health.text);

        Ok(ReportOutcome::Reported {
            passed: health.passed,
            severity: health.severity,
        })
    }
}
