//! # SKIBUS
//!
//! Runs one simulation and writes the event log.
//!
//! ```bash
//! skibus 100 5 20 1000 500
//! ```
//!
//! Exit status 0 once every skier has been delivered, 1 on any error.

use std::process::ExitCode;

use clap::Parser;

use skibus::{init_tracing, Cli};

fn main() -> ExitCode {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not failures
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match cli.execute() {
        Ok(report) => {
            tracing::info!(%report, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("skibus: {err}");
            ExitCode::FAILURE
        }
    }
}
