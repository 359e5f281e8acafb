//! Changed file detection backed by git2

use anyhow::{Context, Result};
use git2::{Delta, DiffOptions, Repository, Status, StatusOptions};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::VersionControl;

/// Files touched on this branch, split by kind of change
#[derive(Debug, Default, PartialEq, Eq)]
struct FileChanges {
    created: BTreeSet<String>,
    modified: BTreeSet<String>,
}

impl FileChanges {
    fn record(&mut self, path: String, created: bool) {
        if created {
            self.modified.remove(&path);
            self.created.insert(path);
        } else if !self.created.contains(&path) {
            self.modified.insert(path);
        }
    }
}

/// A git working copy, optionally compared against a base ref
pub struct GitRepository {
    repo: Repository,
    base: Option<String>,
}

impl GitRepository {
    /// Open the repository containing `path`
    pub fn discover(path: &Path, base: Option<String>) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to find git repository at {}", path.display()))?;

        Ok(Self { repo, base })
    }

    fn changes(&self) -> Result<FileChanges> {
        let mut changes = FileChanges::default();

        if let Some(ref base) = self.base {
            self.collect_committed_changes(base, &mut changes)?;
        }
        self.collect_uncommitted_changes(&mut changes)?;

        Ok(changes)
    }

    /// Staged, unstaged and untracked changes
    fn collect_uncommitted_changes(&self, changes: &mut FileChanges) -> Result<()> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.recurse_untracked_dirs(true);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        let created = Status::INDEX_NEW | Status::WT_NEW;
        let modified = Status::INDEX_MODIFIED
            | Status::WT_MODIFIED
            | Status::INDEX_RENAMED
            | Status::WT_RENAMED
            | Status::INDEX_TYPECHANGE
            | Status::WT_TYPECHANGE;

        for entry in statuses.iter() {
            let Some(path) = entry.path() else {
                continue;
            };
            let status = entry.status();
            if status.intersects(created) {
                changes.record(path.to_string(), true);
            } else if status.intersects(modified) {
                changes.record(path.to_string(), false);
            }
        }

        Ok(())
    }

    /// Changes committed since the merge base of `base` and HEAD
    fn collect_committed_changes(&self, base: &str, changes: &mut FileChanges) -> Result<()> {
        let base_commit = self
            .repo
            .revparse_single(base)
            .with_context(|| format!("Failed to resolve reference: {}", base))?
            .peel_to_commit()?;
        let head = self.repo.head()?.peel_to_commit()?;

        let merge_base = self.repo.merge_base(base_commit.id(), head.id())?;
        let old_tree = self.repo.find_commit(merge_base)?.tree()?;
        let new_tree = head.tree()?;

        let mut diff_opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut diff_opts))?;

        for delta in diff.deltas() {
            let created = match delta.status() {
                Delta::Added => true,
                Delta::Modified | Delta::Renamed | Delta::Copied | Delta::Typechange => false,
                _ => continue,
            };
            if let Some(path) = delta.new_file().path() {
                changes.record(path.to_string_lossy().replace('\\', "/"), created);
            }
        }

        Ok(())
    }
}

impl VersionControl for GitRepository {
    fn root_directory(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    fn current_commit(&self) -> String {
        self.repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .and_then(|commit| commit.as_object().short_id())
            .ok()
            .and_then(|id| id.as_str().map(str::to_string))
            .unwrap_or_else(|| "HEAD".to_string())
    }

    fn modified_files(&self) -> Result<Vec<String>> {
        Ok(self.changes()?.modified.into_iter().collect())
    }

    fn created_files(&self) -> Result<Vec<String>> {
        Ok(self.changes()?.created.into_iter().collect())
    }
}
