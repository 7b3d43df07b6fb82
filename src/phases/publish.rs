//! Phase 3: Build and Publish
//!
//! 1.  **Build**: runs the caller's build command through `sh -c` inside the
//!     checkout, with the base tag exported as `IMG_TAG`. The command is
//!     expected to produce an image under that name.
//! 2.  **Tag**: adds the latest-for-repo and build-identified tags to it.
//! 3.  **Push**: pushes base, latest-for-repo and build-identified, in that
//!     order.
//!
//! Every failure is fatal and nothing is retried or rolled back: when a later
//! push fails, the tags pushed before it stay in the registry. Re-running the
//! job overwrites the same tags.

use std::path::Path;

use log::info;

use crate::defaults::IMAGE_TAG_VAR;
use crate::docker;
use crate::error::{Error, Result};
use crate::image::ImageTags;
use crate::runner::{CommandRunner, ExternalCommand};

/// Execute Phase 3. Returns the tags pushed, in push order.
pub fn execute(
    runner: &dyn CommandRunner,
    checkout: &Path,
    build_command: &str,
    tags: &ImageTags,
) -> Result<Vec<String>> {
    build(runner, checkout, build_command, tags)?;

    docker::tag(runner, tags.base(), tags.latest())?;
    docker::tag(runner, tags.base(), tags.build_identified())?;

    let mut pushed = Vec::with_capacity(3);
    for tag in tags.in_push_order() {
        docker::push(runner, tag)?;
        pushed.push(tag.to_string());
    }
    Ok(pushed)
}

fn build(
    runner: &dyn CommandRunner,
    checkout: &Path,
    build_command: &str,
    tags: &ImageTags,
) -> Result<()> {
    info!("Building {} with `{}`", tags.base(), build_command);

    let command = ExternalCommand::new("sh")
        .args(["-c", build_command])
        .current_dir(checkout)
        .env(IMAGE_TAG_VAR, tags.base())
        .inherit_output();

    let output = runner.run(&command)?;
    if !output.is_success() {
        return Err(Error::Build {
            command: build_command.to_string(),
            status: output.status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunIdentifiers;
    use crate::runner::recording::RecordingRunner;
    use tempfile::TempDir;

    fn tags() -> ImageTags {
        ImageTags::derive(
            "ns",
            "proj",
            &RunIdentifiers {
                commit_sha: "abc".to_string(),
                build_number: "3".to_string(),
                build_timestamp: "20200101-0101".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_build_tag_push_sequence() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();

        let pushed = execute(&runner, temp.path(), "make image", &tags()).unwrap();

        assert_eq!(
            runner.command_lines(),
            vec![
                "sh -c make image",
                "docker tag ns/cccl:proj-abc ns/cccl:proj",
                "docker tag ns/cccl:proj-abc ns/cccl:proj-n-3-id-20200101-0101",
                "docker push ns/cccl:proj-abc",
                "docker push ns/cccl:proj",
                "docker push ns/cccl:proj-n-3-id-20200101-0101",
            ]
        );
        assert_eq!(pushed, runner.pushed_tags());
    }

    #[test]
    fn test_build_sees_base_tag_and_runs_in_checkout() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new();
        execute(&runner, temp.path(), "make image", &tags()).unwrap();

        let build = &runner.calls()[0];
        assert_eq!(
            build.envs,
            vec![("IMG_TAG".to_string(), "ns/cccl:proj-abc".to_string())]
        );
        assert_eq!(build.current_dir.as_deref(), Some(temp.path()));
        assert!(!build.capture_output);
    }

    #[test]
    fn test_build_failure_stops_before_tagging() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_on("sh -c make image", 2);

        let err = execute(&runner, temp.path(), "make image", &tags()).unwrap_err();

        assert!(matches!(err, Error::Build { status: Some(2), .. }));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_second_push_failure_keeps_base_pushed() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_on("docker push ns/cccl:proj", 1);

        let err = execute(&runner, temp.path(), "make image", &tags()).unwrap_err();

        assert!(matches!(err, Error::Publish { .. }));
        assert_eq!(runner.pushed_tags(), vec!["ns/cccl:proj-abc".to_string()]);
        // The build-identified tag is never attempted
        assert!(!runner
            .command_lines()
            .contains(&"docker push ns/cccl:proj-n-3-id-20200101-0101".to_string()));
    }

    #[test]
    fn test_tag_failure_pushes_nothing() {
        let temp = TempDir::new().unwrap();
        let runner = RecordingRunner::new().fail_on("docker tag ns/cccl:proj-abc ns/cccl:proj", 1);

        let err = execute(&runner, temp.path(), "make image", &tags()).unwrap_err();
        assert!(matches!(err, Error::Publish { .. }));
        assert!(runner.pushed_tags().is_empty());
    }
}
