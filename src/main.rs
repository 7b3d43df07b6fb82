//! # System-Test Image CLI
//!
//! This is the binary entry point for the `build-system-test-image` tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Running the orchestrator for the parsed invocation.
//! - Translating errors into the process exit code: a failed build passes its
//!   own exit status through, every other failure exits with 1.
//!
//! The core logic lives in the `cccl_systest` library crate; the binary is a
//! thin wrapper around it.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<cccl_systest::error::Error>()
                .map(cccl_systest::error::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1))
        }
    }
}
