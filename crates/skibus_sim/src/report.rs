//! # Run Reports
//!
//! Counters each participant returns when it finishes, and the summary the
//! orchestrator builds from them.

use std::fmt;
use std::time::Duration;

use skibus_core::{SkierId, Stop};

/// What the bus did during a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusReport {
    /// Stop visits, terminal excluded.
    pub stop_visits: u64,
    /// Times the bus reached the terminal.
    pub terminal_visits: u64,
    /// Admissions granted.
    pub admissions: u64,
    /// Admissions that ended in a seat.
    pub boarded: u64,
    /// Admissions refused for lack of seats.
    pub left_behind: u64,
    /// Skiers dropped at the terminal.
    pub delivered: u64,
    /// Largest roster of any loop.
    pub peak_boarded: usize,
}

/// How one skier's run went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkierReport {
    /// The skier.
    pub id: SkierId,
    /// Stop it waited at.
    pub stop: Stop,
    /// Admissions it received; more than one means it was left behind.
    pub admissions: u32,
}

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Seed the run used.
    pub seed: u64,
    /// Skiers delivered.
    pub delivered: u32,
    /// Wall-clock duration.
    pub elapsed: Duration,
    /// Lines written to the event log.
    pub log_lines: u64,
    /// Bus counters.
    pub bus: BusReport,
    /// Skiers that were left behind at least once.
    pub skiers_left_behind: u32,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered {} skiers in {:.3}s: {} loops, {} stop visits, {} left behind, peak {} aboard, {} log lines (seed {})",
            self.delivered,
            self.elapsed.as_secs_f64(),
            self.bus.terminal_visits,
            self.bus.stop_visits,
            self.bus.left_behind,
            self.bus.peak_boarded,
            self.log_lines,
            self.seed,
        )
    }
}
