//! Phase 2: Source Preparation
//!
//! Retrieves the downstream repository at the requested revision into a fresh
//! working directory, then pins the shared library in every
//! `*requirements.txt` under it to the derived reference.
//!
//! The working directory is disposable. By default it is a temporary
//! directory removed when the run ends; an explicit directory can be given to
//! keep the checkout around for inspection.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::git;
use crate::manifest::ManifestRewriter;
use crate::runner::CommandRunner;

/// Directory the downstream repository is checked out under.
#[derive(Debug)]
pub struct WorkingDirectory {
    // Held so the directory lives as long as the handle
    _temp: Option<TempDir>,
    path: PathBuf,
}

impl WorkingDirectory {
    /// A fresh temporary directory, deleted on drop.
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("cccl-systest-")
            .tempdir()?;
        let path = temp.path().to_path_buf();
        Ok(Self {
            _temp: Some(temp),
            path,
        })
    }

    /// A caller-chosen directory that is kept after the run.
    ///
    /// The directory must not exist yet, or be empty. Its path must be valid
    /// UTF-8 because it is handed to `git` as an argument.
    pub fn persistent(path: &Path) -> Result<Self> {
        if path.to_str().is_none() {
            return Err(Error::Configuration {
                message: format!("Working directory '{}' is not valid UTF-8", path.display()),
                hint: Some("Pass a directory whose path is valid UTF-8 to --workdir".to_string()),
            });
        }
        if path.exists() && fs::read_dir(path)?.next().is_some() {
            return Err(Error::Configuration {
                message: format!("Working directory '{}' is not empty", path.display()),
                hint: Some("Pass a new or empty directory to --workdir".to_string()),
            });
        }
        fs::create_dir_all(path)?;
        Ok(Self {
            _temp: None,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A checked-out, pinned downstream repository.
#[derive(Debug)]
pub struct PreparedSource {
    pub workdir: WorkingDirectory,
    /// Root of the checkout inside `workdir`
    pub checkout: PathBuf,
    /// Manifests whose pin was rewritten
    pub rewritten: Vec<PathBuf>,
}

/// Execute Phase 2: clone `user_repo` at `revision` and rewrite its manifests.
pub fn execute(
    runner: &dyn CommandRunner,
    workdir: WorkingDirectory,
    user_repo: &str,
    repo_name: &str,
    revision: &str,
    rewriter: &ManifestRewriter,
) -> Result<PreparedSource> {
    let url = git::clone_url(user_repo)?;
    let checkout = workdir.path().join(repo_name);

    info!("Retrieving {} at {}", url, revision);
    git::clone_at_revision(runner, &url, revision, &checkout)?;

    let rewritten = rewriter.rewrite_tree(&checkout)?;
    if rewritten.is_empty() {
        info!("No requirement manifest pins the shared library; building as-is");
    }

    Ok(PreparedSource {
        workdir,
        checkout,
        rewritten,
    })
}
