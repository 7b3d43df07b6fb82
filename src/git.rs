use std::fs;
use std::path::Path;

use url::Url;

use crate::defaults::GIT_HOST_URL;
use crate::error::{Error, Result};
use crate::runner::{CommandOutput, CommandRunner, ExternalCommand};

/// Clone URL for an `owner/name` repository slug
pub fn clone_url(user_repo: &str) -> Result<Url> {
    let base = Url::parse(GIT_HOST_URL)?;
    Ok(base.join(&format!("{}.git", user_repo))?)
}

/// Clone a repository and check out a specific revision
///
/// A full clone is used rather than `--depth=1 --branch`, because the revision
/// is usually a commit sha, which `--branch` does not accept.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone_at_revision(
    runner: &dyn CommandRunner,
    url: &Url,
    revision: &str,
    target_dir: &Path,
) -> Result<()> {
    // Remove target directory if it exists (git won't clone into existing non-empty dir)
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }

    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let target = target_dir.to_str().ok_or_else(|| Error::Retrieval {
        url: url.to_string(),
        revision: revision.to_string(),
        message: format!("target '{}' is not valid UTF-8", target_dir.display()),
        hint: None,
    })?;

    let clone = ExternalCommand::new("git")
        .args(["clone", "--quiet", url.as_str()])
        .arg(target);
    let output = runner.run(&clone).map_err(|e| retrieval_error(url, revision, e))?;
    if !output.is_success() {
        return Err(failed_retrieval(url, revision, &output));
    }

    let checkout = ExternalCommand::new("git")
        .args(["checkout", "--quiet", "--detach", revision])
        .current_dir(target_dir);
    let output = runner
        .run(&checkout)
        .map_err(|e| retrieval_error(url, revision, e))?;
    if !output.is_success() {
        return Err(failed_retrieval(url, revision, &output));
    }

    Ok(())
}

fn retrieval_error(url: &Url, revision: &str, cause: Error) -> Error {
    Error::Retrieval {
        url: url.to_string(),
        revision: revision.to_string(),
        message: cause.to_string(),
        hint: None,
    }
}

fn failed_retrieval(url: &Url, revision: &str, output: &CommandOutput) -> Error {
    let stderr = output.failure_message();

    // Provide helpful error message for common auth failures
    let hint = if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "Make sure you have access to the repository. For private repos, ensure an SSH \
             key, git credentials or a personal access token is configured"
                .to_string(),
        )
    } else if stderr.contains("did not match any") || stderr.contains("reference is not a tree") {
        Some(format!("Check that revision '{}' exists in the repository", revision))
    } else {
        None
    };

    Error::Retrieval {
        url: url.to_string(),
        revision: revision.to_string(),
        message: stderr,
        hint,
    }
}
