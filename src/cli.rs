//! CLI argument parsing and run dispatch

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use env_logger::WriteStyle;
use log::info;

use cccl_systest::context::{InvocationParams, RawEnvironment, RunContext};
use cccl_systest::phases::orchestrator::{self, RunOptions, RunOutcome};
use cccl_systest::runner::SystemRunner;

/// Build and publish a system-test image pinned to an f5-cccl revision
///
/// Under CI (TRAVIS set) the pinned revision is TRAVIS_REPO_SLUG at
/// TRAVIS_COMMIT and the registry credentials come from DOCKER_U/DOCKER_P.
/// Outside CI, EDITABLE_REF is required.
#[derive(Parser, Debug)]
#[command(name = "build-system-test-image")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Downstream repository, as <owner>/<name>
    #[arg(value_name = "USER_REPO")]
    user_repo: String,

    /// Downstream revision to build
    #[arg(value_name = "REVISION")]
    revision: String,

    /// Shell command that builds the image named by $IMG_TAG
    #[arg(value_name = "BUILD_CMD")]
    build_command: String,

    /// Registry namespace to push to
    #[arg(value_name = "NAMESPACE")]
    namespace: String,

    /// f5-cccl requirement to pin outside CI, as <user>/<dep>.git@<sha>
    #[arg(value_name = "EDITABLE_REF")]
    editable_ref: Option<String>,

    /// Show what would be done without logging in, cloning, building or pushing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Check out into this directory and keep it, instead of a temporary one
    #[arg(long, value_name = "PATH")]
    workdir: Option<PathBuf>,

    /// Colorize log output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto", value_parser = ["always", "never", "auto"])]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Execute the run described by the arguments
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        let options = RunOptions {
            dry_run: self.dry_run,
            workdir: self.workdir.clone(),
            ..RunOptions::default()
        };
        let run = RunContext::resolve(self.params(), &RawEnvironment::from_process(), Utc::now())?;

        match orchestrator::execute(&run, &SystemRunner, &options)? {
            RunOutcome::Published(report) => {
                info!(
                    "Published {} tag(s) for {} pinned to {}",
                    report.pushed.len(),
                    run.params.user_repo,
                    report.dependency_ref
                );
                if let Some(dir) = &report.kept_workdir {
                    info!("Checkout kept at {}", dir.display());
                }
                for tag in &report.pushed {
                    println!("{}", tag);
                }
            }
            RunOutcome::Skipped { repo_slug } => {
                info!("Nothing published for {} (skipped)", repo_slug);
            }
            RunOutcome::Planned(plan) => {
                for tag in plan.tags.in_push_order() {
                    println!("{}", tag);
                }
            }
        }

        Ok(())
    }

    fn params(&self) -> InvocationParams {
        InvocationParams {
            user_repo: self.user_repo.clone(),
            revision: self.revision.clone(),
            build_command: self.build_command.clone(),
            registry_namespace: self.namespace.clone(),
            editable_ref: self.editable_ref.clone(),
        }
    }

    fn init_logging(&self) {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&self.log_level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        builder
            .write_style(match self.color.as_str() {
                "always" => WriteStyle::Always,
                "never" => WriteStyle::Never,
                _ => WriteStyle::Auto,
            })
            .format_timestamp(None)
            .format_target(false);

        // A logger may already be installed when embedded in tests
        let _ = builder.try_init();
    }
}
