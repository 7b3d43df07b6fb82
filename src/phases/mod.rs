//! Implementation of the phases of a system-test image run.
//!
//! ## Overview
//!
//! A run follows these phases, strictly in sequence:
//! 1. Publish Gate - Decide whether this run may (or must) publish, and log in
//! 2. Source Preparation - Clone the downstream repo and pin the shared library
//! 3. Build and Publish - Run the build command, tag and push the image
//!
//! Context resolution and reference derivation happen before phase 1, in
//! [`crate::context`] and [`crate::reference`]. Each phase depends only on the
//! previous phases and on those pure foundation modules.

pub mod gate;
pub mod orchestrator;
pub mod prepare;
pub mod publish;

// Numbered aliases, matching the phase list above
pub use gate as phase1;
pub use prepare as phase2;
pub use publish as phase3;
