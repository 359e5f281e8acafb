//! Coverage file watcher
//!
//! Watches the configured coverage sources and re-runs the report whenever
//! a test run rewrites one of them.

use anyhow::Result;
use colored::Colorize;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::coverage::CoverageSource;

const DEBOUNCE: Duration = Duration::from_millis(300);

/// Re-runs a report when coverage sources change
pub struct CoverageWatcher {
    sources: Vec<CoverageSource>,
}

impl CoverageWatcher {
    pub fn new(sources: Vec<CoverageSource>) -> Self {
        Self { sources }
    }

    /// Run `on_change` once, then again after every change to a source
    pub fn start<F>(&self, mut on_change: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        on_change()?;

        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            Config::default(),
        )?;

        for (dir, recursive) in self.watch_targets() {
            let mode = if recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            log::debug!("Watching {} ({:?})", dir.display(), mode);
            watcher.watch(&dir, mode)?;
        }

        let names: Vec<String> = self
            .sources
            .iter()
            .map(|s| s.path.display().to_string())
            .collect();
        println!(
            "\n{} {} {}\n",
            "👀".cyan(),
            "Watching coverage in".bold(),
            names.join(", ")
        );
        println!("{}", "Press Ctrl+C to stop\n".dimmed());

        self.event_loop(rx, on_change)
    }

    /// Report once events for the sources have been quiet for the debounce window
    fn event_loop<F>(&self, rx: Receiver<Event>, mut on_change: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let mut pending: Vec<PathBuf> = Vec::new();

        loop {
            let next = if pending.is_empty() {
                rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
            } else {
                rx.recv_timeout(DEBOUNCE)
            };

            match next {
                Ok(event) => {
                    if event.kind.is_access() {
                        continue;
                    }
                    for path in self.changed_sources(&event.paths) {
                        if !pending.contains(&path) {
                            pending.push(path);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    report_changes(&std::mem::take(&mut pending), &mut on_change);
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if !pending.is_empty() {
                        report_changes(&pending, &mut on_change);
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Source paths touched by an event
    fn changed_sources(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        self.sources
            .iter()
            .filter(|source| paths.iter().any(|p| same_file(p, &source.path)))
            .map(|source| source.path.clone())
            .collect()
    }

    /// Directories to watch, with whether they need recursion
    fn watch_targets(&self) -> BTreeMap<PathBuf, bool> {
        let mut targets = BTreeMap::new();
        for source in &self.sources {
            let (dir, recursive) = watch_target(&source.path);
            let entry = targets.entry(dir).or_insert(false);
            *entry |= recursive;
        }
        targets
    }
}

fn report_changes<F>(changed: &[PathBuf], on_change: &mut F)
where
    F: FnMut() -> Result<()>,
{
    let names: Vec<String> = changed.iter().map(|p| p.display().to_string()).collect();
    println!(
        "\n{} {} {}",
        "↻".yellow(),
        "Coverage changed:".bold(),
        names.join(", ").dimmed()
    );

    // A failed run must not stop the watch
    if let Err(e) = on_change() {
        log::error!("Report failed: {:#}", e);
    }

    println!("\n{}", "Watching for changes...".dimmed());
}

/// The source's directory, or its nearest existing ancestor watched recursively
fn watch_target(path: &Path) -> (PathBuf, bool) {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if parent.is_dir() {
        return (parent.to_path_buf(), false);
    }

    let ancestor = parent
        .ancestors()
        .skip(1)
        .find(|a| !a.as_os_str().is_empty() && a.is_dir())
        .unwrap_or(Path::new("."));
    (ancestor.to_path_buf(), true)
}

fn same_file(event_path: &Path, source: &Path) -> bool {
    if event_path == source {
        return true;
    }
    match (event_path.canonicalize(), source.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => source.is_relative() && event_path.ends_with(source),
    }
}
