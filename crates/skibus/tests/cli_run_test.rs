//! End-to-end runs through the command line layer.

use std::path::PathBuf;

use clap::Parser;
use skibus::{AuditCli, Cli, CliError};
use skibus_core::{ConfigError, SimError};

fn temp_path(tag: &str, ext: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_skibus_{tag}_{id}.{ext}"))
}

#[test]
fn test_run_then_audit() {
    let out = temp_path("run", "out");
    let out_arg = out.to_str().unwrap();

    let cli = Cli::try_parse_from([
        "skibus", "--output", out_arg, "--seed", "3", "60", "4", "10", "200", "50",
    ])
    .unwrap();
    let report = cli.execute().unwrap();
    assert_eq!(report.delivered, 60);
    assert_eq!(report.seed, 3);

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count() as u64, report.log_lines);
    assert!(text.starts_with("1: "));

    let audit = AuditCli::try_parse_from(["skibus_audit", out_arg, "60", "4", "10", "200", "50"])
        .unwrap()
        .execute()
        .unwrap();
    assert_eq!(audit.delivered, 60);
    assert_eq!(audit.lines, report.log_lines);

    std::fs::remove_file(&out).ok();
}

#[test]
fn test_config_file_run() {
    let conf = temp_path("conf", "toml");
    let out = temp_path("conf", "out");
    std::fs::write(
        &conf,
        "skiers = 25\nstops = 2\ncapacity = 10\nmax_wait_us = 0\nmax_drive_us = 0\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "skibus",
        "--config",
        conf.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ])
    .unwrap();
    assert_eq!(cli.execute().unwrap().delivered, 25);

    std::fs::remove_file(&conf).ok();
    std::fs::remove_file(&out).ok();
}

#[test]
fn test_invalid_config_creates_no_log() {
    let out = temp_path("invalid", "out");
    let cli = Cli::try_parse_from([
        "skibus",
        "--output",
        out.to_str().unwrap(),
        "1",
        "11",
        "10",
        "0",
        "0",
    ])
    .unwrap();

    assert!(matches!(
        cli.execute(),
        Err(CliError::Config(ConfigError::OutOfRange { name: "stops", .. }))
    ));
    assert!(!out.exists());
}

#[test]
fn test_unwritable_output_reported() {
    let dir = temp_path("missing_dir", "d");
    let out = dir.join("run.out");
    let cli = Cli::try_parse_from(["skibus", "--output", out.to_str().unwrap(), "1", "1", "10", "0", "0"])
        .unwrap();
    assert!(matches!(cli.execute(), Err(CliError::Output { .. })));
}

#[test]
fn test_audit_rejects_mismatched_parameters() {
    let out = temp_path("mismatch", "out");
    let out_arg = out.to_str().unwrap();
    Cli::try_parse_from(["skibus", "--output", out_arg, "10", "2", "10", "0", "0"])
        .unwrap()
        .execute()
        .unwrap();

    let err = AuditCli::try_parse_from(["skibus_audit", out_arg, "11", "2", "10", "0", "0"])
        .unwrap()
        .execute()
        .unwrap_err();
    assert!(matches!(err, CliError::Audit(_)));

    std::fs::remove_file(&out).ok();
}

#[test]
fn test_run_errors_keep_their_cause() {
    let err = CliError::from(SimError::Aborted);
    assert_eq!(err.to_string(), "simulation aborted");
}
