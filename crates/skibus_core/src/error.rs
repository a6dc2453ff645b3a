//! # Error Types
//!
//! Every error is terminal to the run. There is no retry anywhere.
//!
//! - [`ConfigError`]: bad input, raised before any shared state exists
//! - [`ProtocolViolation`]: the boarding protocol broke; always a defect
//! - [`SimError`]: everything a running simulation can fail with

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{SkierId, Stop};

/// Rejected configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Wrong number of positional values.
    #[error("expected {expected} arguments, got {found}")]
    ArgumentCount {
        /// Number the CLI requires.
        expected: usize,
        /// Number actually given.
        found: usize,
    },

    /// A value is not a plain unsigned decimal number.
    #[error("argument `{name}` is not a number: {value:?}")]
    NotNumeric {
        /// Which setting.
        name: &'static str,
        /// The raw text.
        value: String,
    },

    /// A value is outside its documented range.
    #[error("argument `{name}` must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Which setting.
        name: &'static str,
        /// The rejected value.
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },

    /// Positional values and `--config` were both given.
    #[error("positional values cannot be combined with a config file")]
    ConflictingSources,

    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for a run.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A broken invariant of the boarding protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// More skiers aboard than seats.
    #[error("roster overflow: {boarded} aboard a bus of {capacity}")]
    RosterOverflow {
        /// Roster length found.
        boarded: usize,
        /// Bus capacity.
        capacity: usize,
    },

    /// The acknowledgment came from a skier that was not admitted.
    #[error("admitted skier {expected} but skier {got} acknowledged")]
    AckMismatch {
        /// Skier the bus admitted.
        expected: SkierId,
        /// Skier that answered.
        got: SkierId,
    },

    /// An admitted skier went away without acknowledging.
    #[error("skier {0} never acknowledged its admission")]
    AckLost(SkierId),

    /// A queued skier's permit channel is gone.
    #[error("skier {0} stopped waiting for its permit")]
    PermitLost(SkierId),

    /// A skier received a permit for a stop it is not waiting at.
    #[error("skier {skier} waits at {waiting_at} but was admitted at {admitted_at}")]
    WrongStop {
        /// Skier that got the permit.
        skier: SkierId,
        /// Where it actually waits.
        waiting_at: Stop,
        /// Where the bus admitted it.
        admitted_at: Stop,
    },

    /// The waiting count promised a skier the stop's queue does not hold.
    #[error("waiting count at stop {0} has no queued skier behind it")]
    MissingWaiter(Stop),

    /// A waiting count would go below zero.
    #[error("waiting count at stop {stop} would drop below zero ({waiting} - {admitted})")]
    NegativeWaiting {
        /// The stop.
        stop: Stop,
        /// Count before the decrement.
        waiting: usize,
        /// Amount being removed.
        admitted: usize,
    },
}

/// Errors of a running simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// Bad configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The event log could not be written.
    #[error("event log write failed: {0}")]
    Log(#[from] std::io::Error),

    /// The boarding protocol broke.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// The task runtime could not be started.
    #[error("could not spawn {role}: {source}")]
    Spawn {
        /// What failed to start, e.g. `runtime`.
        role: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A worker task panicked (unwinding builds only).
    #[error("worker `{name}` panicked")]
    WorkerPanicked {
        /// Task name, `bus` or `skier-N`.
        name: String,
    },

    /// The run was cancelled after another failure.
    #[error("simulation aborted")]
    Aborted,
}

impl SimError {
    /// True for the knock-on error every worker reports after an abort.
    #[must_use]
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
