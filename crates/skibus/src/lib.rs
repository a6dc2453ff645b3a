//! # SKIBUS
//!
//! Command line front end for the ski shuttle simulation.
//!
//! ## Usage
//!
//! ```bash
//! skibus <SKIERS> <STOPS> <CAPACITY> <MAX_WAIT_US> <MAX_DRIVE_US>
//! skibus --config run.toml --output run.out --seed 7
//! skibus_audit run.out 100 5 20 1000 500
//! ```
//!
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG=skibus=info`
//! for run milestones or `RUST_LOG=debug` to mirror every event.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skibus_core::constants::DEFAULT_OUTPUT;
use skibus_core::{audit, AuditError, AuditReport, ConfigError, EventLog, SimConfig, SimError};
use skibus_sim::{RunReport, Simulation};

/// Anything the binaries can fail with.
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run failed.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// The output log could not be created.
    #[error("cannot create {}: {source}", path.display())]
    Output {
        /// Requested log path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The log to audit could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Input {
        /// Log path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The audited log breaks a boarding rule.
    #[error("audit failed: {0}")]
    Audit(#[from] AuditError),
}

/// Run parameters, either positional or from a TOML file.
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// SKIERS STOPS CAPACITY `MAX_WAIT_US` `MAX_DRIVE_US`
    #[arg(value_name = "VALUES")]
    pub values: Vec<String>,

    /// TOML file with the five run parameters instead of positional values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// Validated configuration.
    ///
    /// # Errors
    ///
    /// Both sources given, or the chosen source is invalid.
    pub fn resolve(&self) -> Result<SimConfig, ConfigError> {
        match &self.config {
            Some(_) if !self.values.is_empty() => Err(ConfigError::ConflictingSources),
            Some(path) => SimConfig::load(path),
            None => SimConfig::from_args(&self.values),
        }
    }
}

/// Simulates a ski shuttle bus and writes the numbered event log.
#[derive(Debug, Parser)]
#[command(name = "skibus", version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Run parameters.
    #[command(flatten)]
    pub run: ConfigArgs,

    /// Event log file (truncated).
    #[arg(long, short, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Seed for stop choice and timings; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Validates the configuration, creates the log and runs.
    ///
    /// # Errors
    ///
    /// Invalid configuration, unwritable output or a failed run.
    pub fn execute(&self) -> Result<RunReport, CliError> {
        let config = self.run.resolve()?;

        let log = EventLog::create(&self.output).map_err(|err| match err {
            SimError::Log(source) => CliError::Output {
                path: self.output.clone(),
                source,
            },
            other => other.into(),
        })?;

        let mut simulation = Simulation::new(config);
        if let Some(seed) = self.seed {
            simulation = simulation.with_seed(seed);
        }
        let report = simulation.run(Arc::new(log))?;
        tracing::info!(output = %self.output.display(), "log written");
        Ok(report)
    }
}

/// Checks a finished event log against the run parameters.
#[derive(Debug, Parser)]
#[command(name = "skibus_audit", version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct AuditCli {
    /// Event log to check.
    pub log: PathBuf,

    /// Parameters the log was produced with.
    #[command(flatten)]
    pub run: ConfigArgs,
}

impl AuditCli {
    /// Reads and audits the log.
    ///
    /// # Errors
    ///
    /// Invalid configuration, unreadable log or a broken rule.
    pub fn execute(&self) -> Result<AuditReport, CliError> {
        let config = self.run.resolve()?;
        let text = fs::read_to_string(&self.log).map_err(|source| CliError::Input {
            path: self.log.clone(),
            source,
        })?;
        Ok(audit(text.lines(), &config)?)
    }
}

/// Installs the stderr subscriber, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_values_parse() {
        let cli = Cli::try_parse_from(["skibus", "100", "5", "20", "1000", "500"]).unwrap();
        assert_eq!(cli.run.values.len(), 5);
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(cli.seed.is_none());

        let config = cli.run.resolve().unwrap();
        assert_eq!(config.skiers(), 100);
        assert_eq!(config.capacity(), 20);
    }

    #[test]
    fn test_negative_value_is_not_a_flag() {
        let cli = Cli::try_parse_from(["skibus", "-5", "5", "20", "1000", "500"]).unwrap();
        assert!(matches!(
            cli.run.resolve(),
            Err(ConfigError::NotNumeric { name: "skiers", .. })
        ));
    }

    #[test]
    fn test_wrong_count_rejected() {
        let cli = Cli::try_parse_from(["skibus", "1", "2"]).unwrap();
        assert!(matches!(
            cli.run.resolve(),
            Err(ConfigError::ArgumentCount { expected: 5, found: 2 })
        ));
    }

    #[test]
    fn test_zero_skiers_rejected() {
        let cli = Cli::try_parse_from(["skibus", "0", "1", "10", "0", "0"]).unwrap();
        assert!(matches!(
            cli.run.resolve(),
            Err(ConfigError::OutOfRange { name: "skiers", value: 0, .. })
        ));
    }

    #[test]
    fn test_config_file_and_values_conflict() {
        let cli = Cli::try_parse_from([
            "skibus", "--config", "run.toml", "1", "1", "10", "0", "0",
        ])
        .unwrap();
        assert!(matches!(
            cli.run.resolve(),
            Err(ConfigError::ConflictingSources)
        ));
    }

    #[test]
    fn test_options_parse() {
        let cli = Cli::try_parse_from([
            "skibus", "--output", "x.out", "--seed", "9", "1", "1", "10", "0", "0",
        ])
        .unwrap();
        assert_eq!(cli.output, PathBuf::from("x.out"));
        assert_eq!(cli.seed, Some(9));
    }

    #[test]
    fn test_audit_cli_takes_log_first() {
        let cli =
            AuditCli::try_parse_from(["skibus_audit", "run.out", "1", "1", "10", "0", "0"]).unwrap();
        assert_eq!(cli.log, PathBuf::from("run.out"));
        assert_eq!(cli.run.values, vec!["1", "1", "10", "0", "0"]);
    }
}
