//! # Image Tags
//!
//! Every published image gets three tags, all derived together from the same
//! run identifiers:
//!
//! | Tag               | Form                                                     |
//! |-------------------|----------------------------------------------------------|
//! | base              | `<namespace>/cccl:<repoName>-<sha>`                      |
//! | latest-for-repo   | `<namespace>/cccl:<repoName>`                            |
//! | build-identified  | `<namespace>/cccl:<repoName>-n-<build>-id-<timestamp>`   |
//!
//! The base tag is the name the build command gives its image; the other two
//! are added afterwards. [`ImageTags`] can only be constructed as a complete
//! set, so one tag can never be recomputed without the others.

use crate::context::RunIdentifiers;
use crate::defaults::IMAGE_REPOSITORY;
use crate::error::{Error, Result};

const MAX_TAG_LEN: usize = 128;

/// The three tags of one published image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTags {
    base: String,
    latest: String,
    build_identified: String,
}

impl ImageTags {
    /// Derive and validate the tag set for a run.
    pub fn derive(namespace: &str, repo_name: &str, ids: &RunIdentifiers) -> Result<Self> {
        let image = format!("{}/{}", namespace, IMAGE_REPOSITORY);
        let base = format!("{}:{}-{}", image, repo_name, ids.commit_sha);
        let latest = format!("{}:{}", image, repo_name);
        let build_identified = format!(
            "{}-n-{}-id-{}",
            latest, ids.build_number, ids.build_timestamp
        );

        let tags = Self {
            base,
            latest,
            build_identified,
        };
        for tag in tags.in_push_order() {
            validate_tag(tag)?;
        }
        Ok(tags)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn latest(&self) -> &str {
        &self.latest
    }

    pub fn build_identified(&self) -> &str {
        &self.build_identified
    }

    /// All tags in the order they are pushed: base first.
    pub fn in_push_order(&self) -> [&str; 3] {
        [
            self.base.as_str(),
            self.latest.as_str(),
            self.build_identified.as_str(),
        ]
    }
}

/// Check the tag part (after the last `:`) against the registry's rules.
fn validate_tag(full: &str) -> Result<()> {
    let tag = full.rsplit_once(':').map(|(_, t)| t).unwrap_or_default();

    let invalid = |reason: &str| Error::Configuration {
        message: format!("Invalid image tag '{}': {}", full, reason),
        hint: Some(
            "Tags may only contain letters, digits, '.', '-' and '_', and may not start with \
             '.' or '-'"
                .to_string(),
        ),
    };

    if tag.is_empty() {
        return Err(invalid("empty tag"));
    }
    if tag.len() > MAX_TAG_LEN {
        return Err(invalid(&format!(
            "{} characters, max {}",
            tag.len(),
            MAX_TAG_LEN
        )));
    }
    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(invalid("leading '.' or '-'"));
    }
    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
    {
        return Err(invalid(&format!("character '{}' not allowed", c)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(commit_sha: &str, build_number: &str) -> RunIdentifiers {
        RunIdentifiers {
            commit_sha: commit_sha.to_string(),
            build_number: build_number.to_string(),
            build_timestamp: "20200101-0101".to_string(),
        }
    }

    #[test]
    fn test_derive_tag_set() {
        let tags = ImageTags::derive("ns", "proj", &ids("abc", "3")).unwrap();
        assert_eq!(tags.base(), "ns/cccl:proj-abc");
        assert_eq!(tags.latest(), "ns/cccl:proj");
        assert_eq!(tags.build_identified(), "ns/cccl:proj-n-3-id-20200101-0101");
        assert_eq!(
            tags.in_push_order(),
            [
                "ns/cccl:proj-abc",
                "ns/cccl:proj",
                "ns/cccl:proj-n-3-id-20200101-0101"
            ]
        );
    }

    #[test]
    fn test_local_build_number() {
        let tags = ImageTags::derive("me", "k8s-bigip-ctlr", &ids("cafef00d", "local")).unwrap();
        assert_eq!(
            tags.build_identified(),
            "me/cccl:k8s-bigip-ctlr-n-local-id-20200101-0101"
        );
    }

    #[test]
    fn test_namespace_with_registry_host() {
        let tags = ImageTags::derive("registry.example.com:5000/team", "proj", &ids("abc", "1"))
            .unwrap();
        assert_eq!(tags.base(), "registry.example.com:5000/team/cccl:proj-abc");
    }

    #[test]
    fn test_rejects_invalid_characters() {
        let err = ImageTags::derive("ns", "proj", &ids("abc/def", "1")).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_rejects_overlong_tag() {
        let sha = "a".repeat(130);
        let err = ImageTags::derive("ns", "proj", &ids(&sha, "1")).unwrap_err();
        assert!(err.to_string().contains("max 128"));
    }

    #[test]
    fn test_rejects_leading_dash() {
        let err = ImageTags::derive("ns", "-proj", &ids("abc", "1")).unwrap_err();
        assert!(err.to_string().contains("leading"));
    }
}
