//! # External Command Execution
//!
//! Every side effect that leaves the process (git, the container CLI, the
//! caller's build command) goes through the [`CommandRunner`] trait. The
//! stages only describe *what* to run as an [`ExternalCommand`] and interpret
//! the [`CommandOutput`]; the runner decides how.
//!
//! In the binary, [`SystemRunner`] executes commands with
//! `std::process::Command`. In tests, a recording runner stands in for git and
//! the registry, so the publish gate and the image publisher can be exercised
//! without network or container access.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// Trait for running external programs - allows mocking in tests
pub trait CommandRunner {
    /// Runs the command to completion.
    ///
    /// A non-zero exit is not an error at this level; callers inspect
    /// [`CommandOutput::is_success`]. `Err` means the program could not be run.
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput>;
}

/// Description of a program invocation.
///
/// `Display` renders the program and its arguments only; stdin is never
/// shown, so secrets belong there.
#[derive(Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    pub stdin: Option<String>,
    /// Capture stdout/stderr instead of streaming them to the terminal
    pub capture_output: bool,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            stdin: None,
            capture_output: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Let the command write straight to the terminal.
    pub fn inherit_output(mut self) -> Self {
        self.capture_output = false;
        self
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalCommand")
            .field("command", &self.to_string())
            .field("current_dir", &self.current_dir)
            .field("envs", &self.envs)
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success() -> Self {
        Self {
            status: Some(0),
            ..Self::default()
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Best available description of why the command failed.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ExternalCommand) -> Result<CommandOutput> {
        debug!("Running: {}", command);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &command.envs {
            cmd.env(key, value);
        }
        if command.stdin.is_some() {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        if command.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let spawn_error = |e: std::io::Error| Error::Command {
            program: command.program.clone(),
            message: e.to_string(),
        };

        let mut child = cmd.spawn().map_err(spawn_error)?;
        // The pipe drops after the write so the child sees EOF.
        let fed = match (&command.stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input.as_bytes()),
            _ => Ok(()),
        };
        // Always reap the child, even when it stopped reading early.
        let output = child.wait_with_output().map_err(spawn_error)?;
        if let Err(e) = fed {
            // Report the child's own failure over the broken pipe
            if output.status.success() {
                return Err(spawn_error(e));
            }
            debug!("{} stopped reading stdin: {}", command.program, e);
        }

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
