//! # Error Handling
//!
//! This module defines the centralized error type for the system-test image
//! publisher. It uses `thiserror` to build a single `Error` enum whose
//! variants follow the failure taxonomy of a run:
//!
//! - **`Configuration`**: a required parameter or environment value is
//!   missing or malformed. Raised before any side effect.
//! - **`Auth`**: the registry login step failed.
//! - **`PublishDenied`**: the canonical repository has no publishing
//!   credentials. This is a policy failure, not a technical one.
//! - **`Retrieval`**: the downstream repository or revision could not be
//!   fetched.
//! - **`Build`**: the caller's build command exited non-zero. Its exit status
//!   is passed through as the process exit code.
//! - **`Publish`**: tagging or pushing an image failed. Tags pushed before the
//!   failure stay pushed.
//!
//! None of these are retried. Re-running the whole job is the recovery path,
//! since every step overwrites the same tags.

use thiserror::Error;

/// Main error type for system-test image runs
#[derive(Error, Debug)]
pub enum Error {
    /// A required invocation parameter or environment value is missing or
    /// malformed.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Configuration {
        message: String,
        /// Optional hint for how to fix the invocation
        hint: Option<String>,
    },

    /// Logging in to the container registry failed.
    #[error("Registry login failed for user '{user}': {message}")]
    Auth { user: String, message: String },

    /// The canonical repository must publish but no credentials were provided.
    #[error("Publishing is required for {repo_slug} but registry credentials or namespace are missing")]
    PublishDenied { repo_slug: String },

    /// The downstream repository could not be retrieved at the requested
    /// revision.
    #[error("Failed to retrieve {url}@{revision}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Retrieval {
        url: String,
        revision: String,
        message: String,
        /// Optional hint for how to resolve the retrieval issue
        hint: Option<String>,
    },

    /// The caller-supplied build command exited unsuccessfully.
    #[error("Build command `{command}` failed{}", status.map(|s| format!(" with exit status {}", s)).unwrap_or_else(|| " (terminated by signal)".to_string()))]
    Build {
        command: String,
        /// Exit status of the build command, `None` when killed by a signal
        status: Option<i32>,
    },

    /// Tagging or pushing an image failed.
    #[error("Image {operation} failed for {tag}: {message}")]
    Publish {
        operation: String,
        tag: String,
        status: Option<i32>,
        message: String,
    },

    /// An external program could not be started at all.
    #[error("Failed to run {program}: {message}")]
    Command { program: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Shorthand for a `Configuration` error without a hint.
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// The process exit code this error should terminate the run with.
    ///
    /// A failed build passes its own exit status through; everything else
    /// exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Build {
                status: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
