//! Git operations module
//!
//! Provides:
//! - The version control capability the reporter consumes
//! - A git2 backed implementation
//! - A fallback for directories outside any repository

mod repository;

pub use repository::GitRepository;

use anyhow::Result;
use std::path::PathBuf;

/// What the reporter needs to know about the working copy
pub trait VersionControl {
    /// Directory coverage paths are resolved against
    fn root_directory(&self) -> PathBuf;

    /// Revision used in report links
    fn current_commit(&self) -> String;

    /// Changed files that already existed, relative to the root
    fn modified_files(&self) -> Result<Vec<String>>;

    /// Files added on this branch or in the working tree, relative to the root
    fn created_files(&self) -> Result<Vec<String>>;
}

/// A plain directory with no history: nothing is created or modified
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl VersionControl for Workspace {
    fn root_directory(&self) -> PathBuf {
        self.root.clone()
    }

    fn current_commit(&self) -> String {
        "HEAD".to_string()
    }

    fn modified_files(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn created_files(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
