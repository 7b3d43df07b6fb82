//! Phase 1: Publish Gate
//!
//! Decides whether this run may publish an image. The policy is:
//!
//! - **Local** runs always publish: the caller opted in by passing an editable
//!   requirement.
//! - **CI** runs with a registry user, password and namespace publish, after a
//!   registry login.
//! - **CI** runs on the canonical repository without them are denied, and the
//!   run must fail: a canonical commit without an image breaks release
//!   integrity.
//! - **CI** runs on any other repository without them skip publishing and
//!   still succeed.
//!
//! [`evaluate`] is a pure function of the context; [`login`] performs the
//! registry login for a permitted CI run; [`decide`] does both.

use crate::context::ExecutionContext;
use crate::defaults::PublishPolicy;
use crate::docker;
use crate::error::Result;
use crate::reference::{self, DependencyRef};
use crate::runner::CommandRunner;

/// Outcome of the publish gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishDecision {
    /// Publishing may proceed, pinning this reference
    Permitted(DependencyRef),
    /// A non-canonical CI run without credentials; skip and exit successfully
    DeniedWarn,
    /// The canonical repository without credentials; the run must fail
    DeniedFatal,
}

/// Evaluate the publish policy without side effects.
///
/// An empty `namespace` counts as missing credentials.
pub fn evaluate(
    context: &ExecutionContext,
    namespace: &str,
    policy: &PublishPolicy,
) -> Result<PublishDecision> {
    match context {
        ExecutionContext::Local(_) => Ok(PublishDecision::Permitted(reference::derive(context)?)),
        ExecutionContext::Ci(ci) => {
            if ci.credentials().is_some() && !namespace.trim().is_empty() {
                Ok(PublishDecision::Permitted(reference::derive(context)?))
            } else if policy.is_canonical(&ci.repo_slug) {
                Ok(PublishDecision::DeniedFatal)
            } else {
                Ok(PublishDecision::DeniedWarn)
            }
        }
    }
}

/// Evaluate the policy and, for a permitted CI run, log in to the registry.
pub fn decide(
    runner: &dyn CommandRunner,
    context: &ExecutionContext,
    namespace: &str,
    policy: &PublishPolicy,
) -> Result<PublishDecision> {
    let decision = evaluate(context, namespace, policy)?;
    if let PublishDecision::Permitted(_) = decision {
        login(runner, context)?;
    }
    Ok(decision)
}

/// Log in to the registry with the CI credentials. Local runs and CI runs
/// without credentials do nothing.
pub fn login(runner: &dyn CommandRunner, context: &ExecutionContext) -> Result<()> {
    if let ExecutionContext::Ci(ci) = context {
        if let Some((user, password)) = ci.credentials() {
            docker::login(runner, user, password)?;
        }
    }
    Ok(())
}
