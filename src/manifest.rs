//! # Requirement Manifest Rewriting
//!
//! Downstream projects pin the shared library through a VCS requirement such
//! as:
//!
//! ```text
//! git+https://github.com/f5devcentral/f5-cccl.git@deadbeef#egg=f5-cccl
//! ```
//!
//! The rewriter replaces the `<canonical>.git@<sha>` portion of such lines with
//! the derived dependency reference and keeps everything from the first `#`
//! on (egg name, extras, trailing comments). Lines without the canonical
//! marker are left alone, and files are only written when their content
//! actually changes, so rewriting twice with the same reference is a no-op.
//!
//! Manifests are handled as raw bytes. A file in some legacy encoding is not an
//! error; only the pin itself is replaced.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, info};
use regex::bytes::{Captures, Regex};
use walkdir::WalkDir;

use crate::defaults::MANIFEST_PATTERN;
use crate::error::Result;
use crate::reference::DependencyRef;

/// Rewrites canonical dependency pins to a given reference.
#[derive(Debug, Clone)]
pub struct ManifestRewriter {
    marker: Regex,
    dependency_ref: DependencyRef,
}

impl ManifestRewriter {
    /// Creates a rewriter replacing pins of `canonical_repo` with `dependency_ref`.
    pub fn new(canonical_repo: &str, dependency_ref: &DependencyRef) -> Result<Self> {
        // The leading group keeps `evilf5devcentral/...` from matching.
        let marker = Regex::new(&format!(
            r"(^|[^A-Za-z0-9_.-]){}\.git@[^#\s]*#",
            regex::escape(canonical_repo)
        ))?;
        Ok(Self {
            marker,
            dependency_ref: dependency_ref.clone(),
        })
    }

    /// Rewrites the pins in `content`, borrowing when nothing matched.
    pub fn rewrite_bytes<'a>(&self, content: &'a [u8]) -> Cow<'a, [u8]> {
        self.marker.replace_all(content, |caps: &Captures| {
            let mut replacement = caps[1].to_vec();
            replacement.extend_from_slice(self.dependency_ref.as_str().as_bytes());
            replacement.push(b'#');
            replacement
        })
    }

    /// [`rewrite_bytes`](Self::rewrite_bytes) for text already in memory.
    pub fn rewrite_str<'a>(&self, content: &'a str) -> Cow<'a, str> {
        match self.rewrite_bytes(content.as_bytes()) {
            Cow::Borrowed(_) => Cow::Borrowed(content),
            // Only whole UTF-8 sequences are matched, so this is lossless
            Cow::Owned(rewritten) => Cow::Owned(String::from_utf8_lossy(&rewritten).into_owned()),
        }
    }

    /// Rewrites one file in place. Returns whether the file changed.
    pub fn rewrite_file(&self, path: &Path) -> Result<bool> {
        let content = fs::read(path)?;
        match self.rewrite_bytes(&content) {
            Cow::Owned(rewritten) if rewritten != content => {
                fs::write(path, rewritten)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Rewrites every manifest under `root`. Returns the files that changed.
    pub fn rewrite_tree(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        for manifest in find_manifests(root)? {
            if self.rewrite_file(&manifest)? {
                info!(
                    "Pinned {} in {}",
                    self.dependency_ref,
                    manifest.strip_prefix(root).unwrap_or(&manifest).display()
                );
                changed.push(manifest);
            } else {
                debug!("No pin to rewrite in {}", manifest.display());
            }
        }
        Ok(changed)
    }
}

/// Finds every `*requirements.txt` file under `root`, skipping `.git`.
///
/// Results are sorted by path.
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(MANIFEST_PATTERN)?;
    let mut manifests = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches(name))
        {
            manifests.push(entry.into_path());
        }
    }

    Ok(manifests)
}
