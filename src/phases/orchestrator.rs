//! Orchestrator for a complete system-test image run
//!
//! This module runs the phases strictly in order, stopping at the first
//! failure:
//!
//! 1. Publish gate (pure); denied runs stop here
//! 2. Derive and validate the image tags, then log in to the registry
//! 3. Retrieve the downstream repository and pin the shared library
//! 4. Build, tag and push the image
//!
//! A denied-but-optional run returns [`RunOutcome::Skipped`]; a denied
//! canonical run returns [`Error::PublishDenied`]. In dry-run mode nothing
//! after the pure gate evaluation is executed.

use std::path::PathBuf;

use log::{error, info, warn};
use url::Url;

use super::gate::{self, PublishDecision};
use super::prepare::{self, WorkingDirectory};
use super::publish;
use crate::context::{ExecutionContext, RunContext};
use crate::defaults::PublishPolicy;
use crate::error::{Error, Result};
use crate::git;
use crate::image::ImageTags;
use crate::manifest::ManifestRewriter;
use crate::reference::DependencyRef;
use crate::runner::CommandRunner;

/// Knobs that do not come from the invocation parameters.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub policy: PublishPolicy,
    /// Stop after planning; no login, retrieval, build or push
    pub dry_run: bool,
    /// Keep the checkout in this directory instead of a temporary one
    pub workdir: Option<PathBuf>,
}

/// What a dry run would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub clone_url: Url,
    pub revision: String,
    pub dependency_ref: DependencyRef,
    pub tags: ImageTags,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub dependency_ref: DependencyRef,
    pub tags: ImageTags,
    /// Manifests whose pin was rewritten
    pub rewritten: Vec<PathBuf>,
    /// Tags pushed, in push order
    pub pushed: Vec<String>,
    /// Checkout location, when it was kept
    pub kept_workdir: Option<PathBuf>,
}

/// Successful end states of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Published(PublishReport),
    /// Publishing was optional and skipped for lack of credentials
    Skipped { repo_slug: String },
    Planned(RunPlan),
}

/// Execute a complete run for an already-resolved context.
pub fn execute(
    run: &RunContext,
    runner: &dyn CommandRunner,
    options: &RunOptions,
) -> Result<RunOutcome> {
    let params = &run.params;
    let decision = gate::evaluate(&run.execution, &params.registry_namespace, &options.policy)?;

    let dependency_ref = match decision {
        PublishDecision::Permitted(dependency_ref) => dependency_ref,
        PublishDecision::DeniedWarn => {
            let repo_slug = ci_repo_slug(&run.execution);
            warn!(
                "Skipping image publish for {}: registry credentials or namespace not provided",
                repo_slug
            );
            return Ok(RunOutcome::Skipped { repo_slug });
        }
        PublishDecision::DeniedFatal => {
            let repo_slug = ci_repo_slug(&run.execution);
            error!(
                "Registry credentials are required to publish {}; refusing to skip",
                repo_slug
            );
            return Err(Error::PublishDenied { repo_slug });
        }
    };

    // Skipped runs never reach tag validation.
    let repo_name = params.repo_name()?;
    let tags = ImageTags::derive(&params.registry_namespace, repo_name, &run.identifiers)?;

    if options.dry_run {
        let plan = RunPlan {
            clone_url: git::clone_url(&params.user_repo)?,
            revision: params.revision.clone(),
            dependency_ref,
            tags,
        };
        info!(
            "Dry run: would build {} at {} pinned to {}",
            plan.clone_url, plan.revision, plan.dependency_ref
        );
        for tag in plan.tags.in_push_order() {
            info!("Dry run: would push {}", tag);
        }
        return Ok(RunOutcome::Planned(plan));
    }

    gate::login(runner, &run.execution)?;

    let workdir = match &options.workdir {
        Some(path) => WorkingDirectory::persistent(path)?,
        None => WorkingDirectory::temporary()?,
    };
    let rewriter = ManifestRewriter::new(&options.policy.canonical_repo, &dependency_ref)?;
    let prepared = prepare::execute(
        runner,
        workdir,
        &params.user_repo,
        repo_name,
        &params.revision,
        &rewriter,
    )?;

    let pushed = publish::execute(runner, &prepared.checkout, &params.build_command, &tags)?;

    Ok(RunOutcome::Published(PublishReport {
        dependency_ref,
        tags,
        rewritten: prepared.rewritten,
        pushed,
        kept_workdir: options.workdir.as_ref().map(|_| prepared.checkout.clone()),
    }))
}

fn ci_repo_slug(context: &ExecutionContext) -> String {
    match context {
        ExecutionContext::Ci(ci) => ci.repo_slug.clone(),
        ExecutionContext::Local(_) => String::new(),
    }
}
