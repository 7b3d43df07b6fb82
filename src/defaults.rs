//! Default values and fixed names used across the publisher.
//!
//! This module centralizes the constants that define the publishing policy and
//! the contract with the CI platform and the external build command.

/// Canonical upstream repository of the shared library.
///
/// Commits to this repository must publish an image; forks may skip.
pub const CANONICAL_REPO: &str = "f5devcentral/f5-cccl";

/// Image repository every system-test image is published under.
pub const IMAGE_REPOSITORY: &str = "cccl";

/// Environment variable carrying the base image tag into the build command.
pub const IMAGE_TAG_VAR: &str = "IMG_TAG";

/// Base URL downstream repositories are cloned from.
pub const GIT_HOST_URL: &str = "https://github.com/";

/// File-name pattern of the requirement manifests to rewrite.
pub const MANIFEST_PATTERN: &str = "*requirements.txt";

/// `chrono` format of the build timestamp used in build-identified tags.
pub const BUILD_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M";

/// Build number used for runs outside CI.
pub const LOCAL_BUILD_NUMBER: &str = "local";

/// Hint shown when a local run lacks an editable requirement.
pub const EDITABLE_REF_HINT: &str =
    "Specify an editable requirement of the form <user>/<dep>.git@<sha>";

/// Environment variables read from the CI platform and the operator.
pub mod env {
    /// Set (non-empty) when running under CI.
    pub const CI_FLAG: &str = "TRAVIS";
    /// `owner/name` of the repository being built by CI.
    pub const REPO_SLUG: &str = "TRAVIS_REPO_SLUG";
    /// Commit of the shared library being built by CI.
    pub const COMMIT: &str = "TRAVIS_COMMIT";
    /// CI build number.
    pub const BUILD_NUMBER: &str = "TRAVIS_BUILD_NUMBER";
    /// Registry user.
    pub const DOCKER_USER: &str = "DOCKER_U";
    /// Registry password.
    pub const DOCKER_PASSWORD: &str = "DOCKER_P";
}

/// The publishing policy: which repository must always publish.
///
/// Defaults to [`CANONICAL_REPO`]; library callers and tests may point it at
/// another repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPolicy {
    pub canonical_repo: String,
}

impl PublishPolicy {
    pub fn new(canonical_repo: impl Into<String>) -> Self {
        Self {
            canonical_repo: canonical_repo.into(),
        }
    }

    /// Whether `repo_slug` names the canonical repository.
    pub fn is_canonical(&self, repo_slug: &str) -> bool {
        self.canonical_repo == repo_slug
    }
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self::new(CANONICAL_REPO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_uses_canonical_repo() {
        let policy = PublishPolicy::default();
        assert_eq!(policy.canonical_repo, CANONICAL_REPO);
        assert!(policy.is_canonical("f5devcentral/f5-cccl"));
        assert!(!policy.is_canonical("someone/f5-cccl"));
    }

    #[test]
    fn test_policy_override() {
        let policy = PublishPolicy::new("acme/lib");
        assert!(policy.is_canonical("acme/lib"));
        assert!(!policy.is_canonical(CANONICAL_REPO));
    }

    #[test]
    fn test_timestamp_format_shape() {
        let ts = chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(1, 1, 0))
            .unwrap()
            .format(BUILD_TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(ts, "20200101-0101");
    }
}
