//! Shared test utilities for CLI E2E tests.
//!
//! This module provides a fixture that runs the binary with a clean
//! environment and, optionally, fake `git` and `docker` executables on `PATH`
//! so complete runs can be exercised without network or a container daemon.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_fake_tools();
//!     fixture.command().args(["a/b", "rev", "true", "ns", "me/x.git@1"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::refs;
    pub use super::TestFixture;
}

/// Reference strings used across tests.
#[allow(dead_code)]
pub mod refs {
    pub const CANONICAL: &str = "f5devcentral/f5-cccl";
    pub const FORK: &str = "someone/f5-cccl";
    pub const EDITABLE: &str = "me/fork.git@cafef00d";
    /// Manifest line the fake git writes into every clone.
    pub const PINNED_LINE: &str =
        "git+https://github.com/f5devcentral/f5-cccl.git@deadbeef#egg=f5-cccl";
}

/// Environment variables the binary reads; removed from every command.
const RUN_ENV_VARS: &[&str] = &[
    "TRAVIS",
    "TRAVIS_REPO_SLUG",
    "TRAVIS_COMMIT",
    "TRAVIS_BUILD_NUMBER",
    "DOCKER_U",
    "DOCKER_P",
    "RUST_LOG",
];

const FAKE_GIT: &str = r#"#!/bin/sh
case "$1" in
  clone)
    for last; do :; done
    mkdir -p "$last/python"
    printf '%s\n' "$FAKE_PINNED_LINE" > "$last/requirements.txt"
    printf 'pytest\n' > "$last/python/test-requirements.txt"
    ;;
esac
exit 0
"#;

const FAKE_DOCKER: &str = r#"#!/bin/sh
if [ "$1" = login ]; then cat > /dev/null; fi
if [ -n "$FAKE_DOCKER_FAIL" ] && [ "$*" = "$FAKE_DOCKER_FAIL" ]; then
  echo "simulated failure: $*" >&2
  exit 1
fi
echo "$*" >> "$FAKE_DOCKER_LOG"
exit 0
"#;

/// A temporary directory plus helpers for driving the binary.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
    fake_tools: bool,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            fake_tools: false,
        }
    }

    /// Put fake `git` and `docker` executables first on `PATH`.
    #[cfg(unix)]
    #[allow(dead_code)]
    pub fn with_fake_tools(mut self) -> Self {
        use std::os::unix::fs::PermissionsExt;

        for (name, script) in [("git", FAKE_GIT), ("docker", FAKE_DOCKER)] {
            let tool = self.temp_dir.child("bin").child(name);
            tool.write_str(script).expect("Failed to write fake tool");
            std::fs::set_permissions(tool.path(), std::fs::Permissions::from_mode(0o755))
                .expect("Failed to make fake tool executable");
        }
        self.fake_tools = true;
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory to pass to `--workdir`.
    #[allow(dead_code)]
    pub fn workdir(&self) -> PathBuf {
        self.path().join("work")
    }

    /// Commands the fake docker accepted, one per line.
    #[allow(dead_code)]
    pub fn docker_log(&self) -> Vec<String> {
        std::fs::read_to_string(self.path().join("docker.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Create a command with the run's environment variables cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("build-system-test-image");
        cmd.current_dir(self.path());
        for var in RUN_ENV_VARS {
            cmd.env_remove(var);
        }

        if self.fake_tools {
            let path = std::env::var_os("PATH").unwrap_or_default();
            let mut dirs = vec![self.path().join("bin")];
            dirs.extend(std::env::split_paths(&path));
            cmd.env("PATH", std::env::join_paths(dirs).expect("valid PATH"))
                .env("FAKE_DOCKER_LOG", self.path().join("docker.log"))
                .env("FAKE_PINNED_LINE", refs::PINNED_LINE);
        }
        cmd
    }

    /// Create a command that looks like a CI run of `repo_slug`.
    #[allow(dead_code)]
    pub fn ci_command(&self, repo_slug: &str, with_credentials: bool) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.env("TRAVIS", "true")
            .env("TRAVIS_REPO_SLUG", repo_slug)
            .env("TRAVIS_COMMIT", "abc123")
            .env("TRAVIS_BUILD_NUMBER", "42");
        if with_credentials {
            cmd.env("DOCKER_U", "bot").env("DOCKER_P", "hunter2");
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
