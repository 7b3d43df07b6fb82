//! Container CLI primitives: login, tag and push.
//!
//! Each primitive runs one `docker` command through a [`CommandRunner`] and
//! turns a failed exit into the matching error kind. Nothing here retries.

use log::info;

use crate::error::{Error, Result};
use crate::runner::{CommandOutput, CommandRunner, ExternalCommand};

const DOCKER: &str = "docker";

/// Log in to the registry. The password is passed on stdin.
pub fn login(runner: &dyn CommandRunner, user: &str, password: &str) -> Result<()> {
    let command = ExternalCommand::new(DOCKER)
        .args(["login", "-u", user, "--password-stdin"])
        .stdin(password);

    let auth_error = |message: String| Error::Auth {
        user: user.to_string(),
        message,
    };

    let output = runner.run(&command).map_err(|e| auth_error(e.to_string()))?;
    if !output.is_success() {
        return Err(auth_error(output.failure_message()));
    }

    info!("Logged in to registry as {}", user);
    Ok(())
}

/// Add `target` as another name for the image `source`.
pub fn tag(runner: &dyn CommandRunner, source: &str, target: &str) -> Result<()> {
    let command = ExternalCommand::new(DOCKER).args(["tag", source, target]);
    let output = runner
        .run(&command)
        .map_err(|e| publish_error("tag", target, None, e.to_string()))?;
    check("tag", target, &output)
}

/// Push one tag to the registry.
pub fn push(runner: &dyn CommandRunner, tag: &str) -> Result<()> {
    let command = ExternalCommand::new(DOCKER).args(["push", tag]);
    let output = runner
        .run(&command)
        .map_err(|e| publish_error("push", tag, None, e.to_string()))?;
    check("push", tag, &output)?;

    info!("Pushed {}", tag);
    Ok(())
}

fn check(operation: &str, tag: &str, output: &CommandOutput) -> Result<()> {
    if output.is_success() {
        Ok(())
    } else {
        Err(publish_error(
            operation,
            tag,
            output.status,
            output.failure_message(),
        ))
    }
}

fn publish_error(operation: &str, tag: &str, status: Option<i32>, message: String) -> Error {
    Error::Publish {
        operation: operation.to_string(),
        tag: tag.to_string(),
        status,
        message,
    }
}
