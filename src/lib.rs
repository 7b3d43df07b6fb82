//! # CCCL System-Test Image Library
//!
//! This library builds and publishes "system test" container images for
//! projects that depend on the F5 Common Controller Core Library (f5-cccl).
//! Given a downstream repository, a revision, a build command and a registry
//! namespace, it produces an image whose Python requirements pin one exact
//! f5-cccl revision, so the downstream test suite exercises that revision.
//!
//! It is designed to be driven by the `build-system-test-image` command-line
//! tool, but the phases can be used on their own.
//!
//! ## Quick Example
//!
//! ```
//! use cccl_systest::context::RunIdentifiers;
//! use cccl_systest::image::ImageTags;
//! use cccl_systest::manifest::ManifestRewriter;
//! use cccl_systest::reference::DependencyRef;
//!
//! let pin = DependencyRef::parse("me/fork.git@cafef00d").unwrap();
//! let rewriter = ManifestRewriter::new("f5devcentral/f5-cccl", &pin).unwrap();
//! assert_eq!(
//!     rewriter.rewrite_str("f5devcentral/f5-cccl.git@deadbeef#egg=f5-cccl"),
//!     "me/fork.git@cafef00d#egg=f5-cccl"
//! );
//!
//! let ids = RunIdentifiers {
//!     commit_sha: pin.commit_sha().to_string(),
//!     build_number: "local".to_string(),
//!     build_timestamp: "20200101-0101".to_string(),
//! };
//! let tags = ImageTags::derive("me", "proj", &ids).unwrap();
//! assert_eq!(tags.base(), "me/cccl:proj-cafef00d");
//! ```
//!
//! ## Core Concepts
//!
//! - **Execution context (`context`)**: classifies the run as CI or local,
//!   from a one-time snapshot of the process environment.
//! - **Dependency references (`reference`)**: the `<owner>/<name>.git@<sha>`
//!   pin injected into the downstream project.
//! - **Image tags (`image`)**: the base, latest-for-repo and build-identified
//!   tags, always derived together.
//! - **Manifests (`manifest`)**: in-place rewriting of `*requirements.txt`.
//! - **External commands (`runner`, `git`, `docker`)**: every side effect goes
//!   through the `CommandRunner` trait, so it can be replaced in tests.
//! - **Phases (`phases`)**: the publish gate, source preparation, and
//!   build-and-publish, run in order by `phases::orchestrator`.

pub mod context;
pub mod defaults;
pub mod docker;
pub mod error;
pub mod git;
pub mod image;
pub mod manifest;
pub mod phases;
pub mod reference;
pub mod runner;

#[cfg(test)]
mod manifest_proptest;
