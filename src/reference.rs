//! # Dependency References
//!
//! A dependency reference names the exact revision of the shared library that
//! a downstream project should install, in the form pip understands inside a
//! VCS requirement: `<owner>/<name>.git@<sha>`.
//!
//! The reference injected into the downstream manifests is derived from the
//! execution context:
//!
//! - **CI**: always `<repoSlug>.git@<commitSha>`, the commit CI is building.
//!   Any editable requirement passed on the command line is ignored.
//! - **Local**: the editable requirement supplied by the caller, verbatim.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::context::ExecutionContext;
use crate::defaults::EDITABLE_REF_HINT;
use crate::error::{Error, Result};

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^/\s#@]+/[^/\s#@]+\.git@[^\s#@]+$").expect("reference pattern is valid")
    })
}

/// A validated `<owner>/<name>.git@<sha>` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRef(String);

impl DependencyRef {
    /// Parses and validates a reference string. The string is kept verbatim.
    pub fn parse(value: &str) -> Result<Self> {
        if reference_pattern().is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(Error::Configuration {
                message: format!("Invalid editable requirement '{}'", value),
                hint: Some(EDITABLE_REF_HINT.to_string()),
            })
        }
    }

    /// Builds the reference for a repository slug and commit.
    pub fn from_parts(repo_slug: &str, commit_sha: &str) -> Result<Self> {
        Self::parse(&format!("{}.git@{}", repo_slug, commit_sha))
    }

    /// The commit portion: everything after the last `@`.
    pub fn commit_sha(&self) -> &str {
        self.0.rsplit_once('@').map(|(_, sha)| sha).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the reference to inject for the given context.
pub fn derive(context: &ExecutionContext) -> Result<DependencyRef> {
    match context {
        ExecutionContext::Ci(ci) => DependencyRef::from_parts(&ci.repo_slug, &ci.commit_sha),
        ExecutionContext::Local(local) => Ok(local.editable_ref.clone()),
    }
}
