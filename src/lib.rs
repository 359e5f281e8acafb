//! covx - coverage reports for changed files
//!
//! A library for turning test coverage output into review-ready reports:
//! - LCOV and JSON summary parsing into one normalized model
//! - Created/modified file selection from git
//! - Sorting, truncation and totals
//! - Markdown, text and JSON tables with threshold health checks
//! - Watch mode that re-reports when coverage files change

pub mod config;
pub mod coverage;
pub mod error;
pub mod fs;
pub mod git;
pub mod paths;
pub mod report;
pub mod reporter;
pub mod watcher;

pub use config::Config;
pub use coverage::{CoverageCollection, CoverageEntry, CoverageItem, CoverageModel, CoverageSource, SourceType};
pub use error::{CoverageError, ParseError};
pub use reporter::{ConsoleSink, ReportOutcome, Reporter, Sink};
