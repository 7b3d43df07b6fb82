//! # Execution Context
//!
//! This module classifies a run as a CI run or a local (manual) run and
//! gathers everything the later stages need to know about it.
//!
//! Process environment is read exactly once, into a [`RawEnvironment`]. The
//! resolver turns that snapshot plus the invocation parameters into an
//! immutable [`RunContext`]; nothing downstream reads the environment again,
//! which keeps the publish gate and the reference deriver pure functions of
//! the context.
//!
//! ## Classification
//!
//! - **CI** when the CI flag is set. The repository slug, commit and build
//!   number come from the CI platform; registry credentials are optional.
//! - **Local** otherwise. The caller must pass an editable requirement
//!   (`<owner>/<name>.git@<sha>`); its commit becomes the commit of the run and
//!   the build number is `local`.
//!
//! Both kinds of run get a build timestamp from the clock passed in.

use std::env;
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::defaults::{self, BUILD_TIMESTAMP_FORMAT, EDITABLE_REF_HINT, LOCAL_BUILD_NUMBER};
use crate::error::{Error, Result};
use crate::reference::DependencyRef;

/// The positional parameters a run is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParams {
    /// Downstream repository, `owner/name`
    pub user_repo: String,
    /// Downstream revision to build
    pub revision: String,
    /// Shell command that builds the image
    pub build_command: String,
    /// Registry namespace images are pushed under
    pub registry_namespace: String,
    /// Editable requirement, only required outside CI
    pub editable_ref: Option<String>,
}

impl InvocationParams {
    /// Checks that every required parameter is present and well formed.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("USER_REPO", &self.user_repo),
            ("REVISION", &self.revision),
            ("BUILD_CMD", &self.build_command),
            ("NAMESPACE", &self.registry_namespace),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::configuration(format!("{} must not be empty", name)));
            }
        }

        self.repo_name().map(|_| ())
    }

    /// The `name` part of `owner/name`.
    pub fn repo_name(&self) -> Result<&str> {
        match self.user_repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(name)
            }
            _ => Err(Error::Configuration {
                message: format!("Invalid repository '{}'", self.user_repo),
                hint: Some("Repositories are given as <owner>/<name>".to_string()),
            }),
        }
    }

    /// The editable requirement, treating an empty string as absent.
    fn editable_ref(&self) -> Option<&str> {
        self.editable_ref.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Snapshot of the environment variables a run depends on.
///
/// Empty values are treated as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawEnvironment {
    pub ci: bool,
    pub repo_slug: Option<String>,
    pub commit: Option<String>,
    pub build_number: Option<String>,
    pub docker_user: Option<String>,
    pub docker_password: Option<String>,
}

impl RawEnvironment {
    /// Reads the snapshot from the current process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the snapshot from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            ci: get(defaults::env::CI_FLAG).is_some(),
            repo_slug: get(defaults::env::REPO_SLUG),
            commit: get(defaults::env::COMMIT),
            build_number: get(defaults::env::BUILD_NUMBER),
            docker_user: get(defaults::env::DOCKER_USER),
            docker_password: get(defaults::env::DOCKER_PASSWORD),
        }
    }
}

impl fmt::Debug for RawEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawEnvironment")
            .field("ci", &self.ci)
            .field("repo_slug", &self.repo_slug)
            .field("commit", &self.commit)
            .field("build_number", &self.build_number)
            .field("docker_user", &self.docker_user)
            .field(
                "docker_password",
                &self.docker_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Values collected for a CI run.
#[derive(Clone, PartialEq, Eq)]
pub struct CiContext {
    pub repo_slug: String,
    pub commit_sha: String,
    pub build_number: String,
    pub docker_user: Option<String>,
    pub docker_password: Option<String>,
}

impl CiContext {
    /// User and password, when both are present.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.docker_user, &self.docker_password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for CiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CiContext")
            .field("repo_slug", &self.repo_slug)
            .field("commit_sha", &self.commit_sha)
            .field("build_number", &self.build_number)
            .field("docker_user", &self.docker_user)
            .field(
                "docker_password",
                &self.docker_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Values collected for a local run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalContext {
    pub editable_ref: DependencyRef,
}

/// Which kind of run this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionContext {
    Ci(CiContext),
    Local(LocalContext),
}

impl ExecutionContext {
    pub fn is_ci(&self) -> bool {
        matches!(self, ExecutionContext::Ci(_))
    }
}

/// Identifiers that end up in the image tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentifiers {
    /// Commit of the shared library the image embeds
    pub commit_sha: String,
    pub build_number: String,
    pub build_timestamp: String,
}

/// Everything resolved about a run before any side effect happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub params: InvocationParams,
    pub execution: ExecutionContext,
    pub identifiers: RunIdentifiers,
}

impl RunContext {
    /// Validates the parameters and classifies the run.
    pub fn resolve(
        params: InvocationParams,
        env: &RawEnvironment,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        params.validate()?;
        let build_timestamp = now.format(BUILD_TIMESTAMP_FORMAT).to_string();

        let (execution, identifiers) = if env.ci {
            let ci = resolve_ci(env)?;
            if let Some(ignored) = params.editable_ref() {
                warn!(
                    "Ignoring editable requirement '{}' under CI; pinning {}.git@{}",
                    ignored, ci.repo_slug, ci.commit_sha
                );
            }
            let identifiers = RunIdentifiers {
                commit_sha: ci.commit_sha.clone(),
                build_number: ci.build_number.clone(),
                build_timestamp,
            };
            (ExecutionContext::Ci(ci), identifiers)
        } else {
            let raw = params.editable_ref().ok_or_else(|| Error::Configuration {
                message: "An editable requirement is required outside CI".to_string(),
                hint: Some(EDITABLE_REF_HINT.to_string()),
            })?;
            let editable_ref = DependencyRef::parse(raw)?;
            let identifiers = RunIdentifiers {
                commit_sha: editable_ref.commit_sha().to_string(),
                build_number: LOCAL_BUILD_NUMBER.to_string(),
                build_timestamp,
            };
            (
                ExecutionContext::Local(LocalContext { editable_ref }),
                identifiers,
            )
        };

        debug!("Resolved execution context: {:?}", execution);
        Ok(Self {
            params,
            execution,
            identifiers,
        })
    }
}

fn resolve_ci(env: &RawEnvironment) -> Result<CiContext> {
    let require = |value: &Option<String>, name: &str| {
        value.clone().ok_or_else(|| Error::Configuration {
            message: format!("{} is not set", name),
            hint: Some("CI runs expect the CI platform to provide this variable".to_string()),
        })
    };

    Ok(CiContext {
        repo_slug: require(&env.repo_slug, defaults::env::REPO_SLUG)?,
        commit_sha: require(&env.commit, defaults::env::COMMIT)?,
        build_number: require(&env.build_number, defaults::env::BUILD_NUMBER)?,
        docker_user: env.docker_user.clone(),
        docker_password: env.docker_password.clone(),
    })
}
