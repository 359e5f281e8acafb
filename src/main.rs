use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use covx::config::{Config, SourcePath};
use covx::coverage::{ReportFileSet, SortMethod};
use covx::fs::LocalFileSystem;
use covx::git::{GitRepository, VersionControl, Workspace};
use covx::report::{ReportFormat, ReportMode};
use covx::reporter::{ConsoleSink, Reporter};
use covx::watcher::CoverageWatcher;

const CONFIG_FILE: &str = "covx.toml";

#[derive(Parser)]
#[command(name = "covx")]
#[command(about = "Coverage tables and threshold checks for the files your branch touched")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: covx.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the coverage report once
    Report(ReportArgs),

    /// Re-print the report whenever a coverage file changes
    Watch(ReportArgs),
}

/// Overrides for values from the config file
#[derive(Args)]
struct ReportArgs {
    /// Coverage file; repeat to merge several (format inferred from the name)
    #[arg(short, long = "source")]
    sources: Vec<PathBuf>,

    /// Files to report: created, modified, createdOrModified, all
    #[arg(long)]
    file_set: Option<ReportFileSet>,

    /// alphabetically, least-coverage, most-coverage, largest-file-size,
    /// smallest-file-size, uncovered-lines
    #[arg(long)]
    sort: Option<SortMethod>,

    /// Files listed before the rest is rolled into one row
    #[arg(long)]
    max_entries: Option<usize>,

    /// What a threshold miss does: warn, fail, message
    #[arg(long)]
    mode: Option<ReportMode>,

    /// markdown, text, json
    #[arg(long)]
    format: Option<ReportFormat>,

    /// Ref to compare against when finding created/modified files
    #[arg(long)]
    base: Option<String>,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,
}

impl ReportArgs {
    fn apply(&self, config: &mut Config, cwd: &Path) {
        if !self.sources.is_empty() {
            config.sources = self
                .sources
                .iter()
                .map(|p| SourcePath::Inferred(cwd.join(p)))
                .collect();
        }
        if let Some(file_set) = self.file_set {
            config.file_set = file_set;
        }
        if let Some(sort) = self.sort {
            config.sort = sort;
        }
        if self.max_entries.is_some() {
            config.max_entries = self.max_entries;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.base.is_some() {
            config.base = self.base.clone();
        }
    }
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Explicit config must exist; the default one is optional
fn load_config(path: Option<&Path>, cwd: &Path) -> Result<(Config, PathBuf)> {
    match path {
        Some(path) => {
            let config_path = std::fs::canonicalize(path)
                .with_context(|| format!("Could not find config file: {}", path.display()))?;
            let base_dir = config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| cwd.to_path_buf());
            Ok((Config::load(&config_path)?, base_dir))
        }
        None => {
            let default_path = cwd.join(CONFIG_FILE);
            if default_path.is_file() {
                Ok((Config::load(&default_path)?, cwd.to_path_buf()))
            } else {
                log::debug!("No {} found, using defaults", CONFIG_FILE);
                Ok((Config::default(), cwd.to_path_buf()))
            }
        }
    }
}

fn open_repository(base_dir: &Path, config: &Config) -> Box<dyn VersionControl> {
    match GitRepository::discover(base_dir, config.base.clone()) {
        Ok(repo) => Box::new(repo),
        Err(e) => {
            if config.file_set != ReportFileSet::All {
                log::warn!("{:#}; no files will count as created or modified", e);
            }
            Box::new(Workspace::new(base_dir))
        }
    }
}

/// Returns false when the run should fail the build
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().context("Could not read current directory")?;
    let (mut config, base_dir) = load_config(cli.config.as_deref(), &cwd)?;

    let (args, watch) = match &cli.command {
        Commands::Report(args) => (args, false),
        Commands::Watch(args) => (args, true),
    };
    args.apply(&mut config, &cwd);
    config.validate()?;

    let colorize = !args.no_color && std::io::stdout().is_terminal();
    if !colorize {
        colored::control::set_override(false);
    }

    let sources = config.coverage_sources(&base_dir);
    let vcs = open_repository(&base_dir, &config);
    let fs = LocalFileSystem;
    let reporter = Reporter::new(&fs, vcs.as_ref());
    let mut sink = ConsoleSink;

    if watch {
        let watcher = CoverageWatcher::new(sources.clone());
        watcher.start(|| {
            reporter.run(&config, &sources, colorize, &mut sink)?;
            Ok(())
        })?;
        return Ok(true);
    }

    let outcome = reporter.run(&config, &sources, colorize, &mut sink)?;
    Ok(!outcome.is_failure())
}
