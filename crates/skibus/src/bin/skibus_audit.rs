//! # SKIBUS Audit
//!
//! Replays a finished log and checks the boarding rules.
//!
//! ```bash
//! skibus_audit skibus.out 100 5 20 1000 500
//! ```

use std::process::ExitCode;

use clap::Parser;

use skibus::{init_tracing, AuditCli};

fn main() -> ExitCode {
    init_tracing();

    let cli = match AuditCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
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
            println!(
                "ok: {} lines, {} delivered over {} loops, peak {} aboard, {} left behind",
                report.lines,
                report.delivered,
                report.terminal_visits,
                report.peak_aboard,
                report.left_behind
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("skibus_audit: {}: {err}", cli.log.display());
            ExitCode::FAILURE
        }
    }
}
