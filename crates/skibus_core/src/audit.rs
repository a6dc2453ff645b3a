//! # Log Audit
//!
//! Replays a finished run log and checks every protocol property that is
//! visible from the outside:
//!
//! - sequence numbers start at 1 and have no gaps
//! - a skier boards only while the bus is at the stop it arrived at
//! - a skier is left behind only when every seat is taken
//! - never more than `capacity` skiers between two terminal visits
//! - the bus is at one place at a time: a stop, the terminal, or the road
//! - every skier boards once and is delivered once, after boarding, while
//!   the bus is at the terminal
//! - nobody is still aboard when the bus leaves the terminal
//! - the bus finishes last, after all N deliveries

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::SimConfig;
use crate::event::{Event, LogLine, ParseEventError};
use crate::types::{SkierId, Stop};

/// The first property a log breaks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// A line is not a numbered event.
    #[error("line {line_no}: {source}")]
    Unparseable {
        /// 1-based line in the file.
        line_no: usize,
        /// Parse failure.
        #[source]
        source: ParseEventError,
    },

    /// Sequence numbers skip or repeat.
    #[error("expected sequence number {expected}, found {found}")]
    SequenceGap {
        /// Next number due.
        expected: u64,
        /// Number on the line.
        found: u64,
    },

    /// A line follows `BUS: finish`.
    #[error("line {0} comes after the bus finished")]
    AfterFinish(u64),

    /// The bus left a stop it was not at.
    #[error("line {seq}: bus left {left} while at {at:?}")]
    BusStopMismatch {
        /// Offending line.
        seq: u64,
        /// Stop it claims to leave.
        left: Stop,
        /// Stop it was at, if any.
        at: Option<Stop>,
    },

    /// The bus arrived somewhere before leaving where it was, left the
    /// terminal without arriving, or finished while parked.
    #[error("line {seq}: bus event out of order")]
    BusOutOfOrder {
        /// Offending line.
        seq: u64,
    },

    /// A skier got off away from the terminal.
    #[error("line {seq}: skier {skier} delivered while the bus is not at the terminal")]
    DeliveredOutsideTerminal {
        /// Offending line.
        seq: u64,
        /// The skier.
        skier: SkierId,
    },

    /// A stop outside `1..=stops`.
    #[error("line {seq}: stop {stop} does not exist")]
    UnknownStop {
        /// Offending line.
        seq: u64,
        /// The stop.
        stop: Stop,
    },

    /// A skier id outside `1..=skiers`.
    #[error("line {seq}: skier {skier} is not part of this run")]
    UnknownSkier {
        /// Offending line.
        seq: u64,
        /// The skier.
        skier: SkierId,
    },

    /// A skier event for a skier that never arrived, or arrived twice.
    #[error("line {seq}: skier {skier} out of order")]
    SkierOutOfOrder {
        /// Offending line.
        seq: u64,
        /// The skier.
        skier: SkierId,
    },

    /// A skier boarded, or was left behind, away from its stop.
    #[error("line {seq}: skier {skier} waits at {waiting_at} but the bus is at {bus_at:?}")]
    WrongStop {
        /// Offending line.
        seq: u64,
        /// The skier.
        skier: SkierId,
        /// Its arrival stop.
        waiting_at: Stop,
        /// Where the bus was.
        bus_at: Option<Stop>,
    },

    /// More skiers aboard than seats.
    #[error("line {seq}: {aboard} skiers aboard a bus of {capacity}")]
    OverCapacity {
        /// Offending line.
        seq: u64,
        /// Riders counted.
        aboard: usize,
        /// Seats.
        capacity: usize,
    },

    /// A skier was turned away while seats were free.
    #[error("line {seq}: skier {skier} left behind with {aboard} of {capacity} seats taken")]
    NeedlessRefusal {
        /// Offending line.
        seq: u64,
        /// The skier.
        skier: SkierId,
        /// Riders counted.
        aboard: usize,
        /// Seats.
        capacity: usize,
    },

    /// The bus left the terminal with riders still aboard.
    #[error("line {seq}: bus left the terminal with {aboard} aboard")]
    RidersNotDelivered {
        /// Offending line.
        seq: u64,
        /// Riders left.
        aboard: usize,
    },

    /// The log ends before the run is complete.
    #[error("run incomplete: {delivered} of {expected} delivered, finished = {finished}")]
    Incomplete {
        /// Deliveries seen.
        delivered: usize,
        /// Skiers in the run.
        expected: usize,
        /// Whether `BUS: finish` was seen.
        finished: bool,
    },
}

/// Summary of a log that passed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Lines checked.
    pub lines: u64,
    /// Skiers delivered.
    pub delivered: usize,
    /// Terminal visits.
    pub terminal_visits: usize,
    /// Most skiers aboard at once.
    pub peak_aboard: usize,
    /// Times a skier was left behind.
    pub left_behind: usize,
}

#[derive(Default)]
struct Replay {
    expected_seq: u64,
    bus_at: Option<Stop>,
    at_terminal: bool,
    finished: bool,
    arrived: HashMap<SkierId, Stop>,
    boarded: HashSet<SkierId>,
    delivered: HashSet<SkierId>,
    aboard: usize,
    report: AuditReport,
}

/// Checks a complete run log against `config`.
///
/// # Errors
///
/// The first property the log breaks.
pub fn audit<I, S>(lines: I, config: &SimConfig) -> Result<AuditReport, AuditError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut replay = Replay {
        expected_seq: 1,
        ..Replay::default()
    };

    for (idx, raw) in lines.into_iter().enumerate() {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            continue;
        }
        let line: LogLine = raw.parse().map_err(|source| AuditError::Unparseable {
            line_no: idx + 1,
            source,
        })?;
        replay.step(line, config)?;
    }

    let expected = config.skiers() as usize;
    if !replay.finished || replay.delivered.len() != expected {
        return Err(AuditError::Incomplete {
            delivered: replay.delivered.len(),
            expected,
            finished: replay.finished,
        });
    }

    replay.report.delivered = replay.delivered.len();
    Ok(replay.report)
}

impl Replay {
    fn step(&mut self, line: LogLine, config: &SimConfig) -> Result<(), AuditError> {
        let seq = line.seq;
        if seq != self.expected_seq {
            return Err(AuditError::SequenceGap {
                expected: self.expected_seq,
                found: seq,
            });
        }
        self.expected_seq += 1;
        self.report.lines = seq;

        if self.finished {
            return Err(AuditError::AfterFinish(seq));
        }

        if let Some(skier) = line.event.skier() {
            if !(1..=config.skiers()).contains(&skier.0) {
                return Err(AuditError::UnknownSkier { seq, skier });
            }
        }

        let capacity = config.capacity();
        let out_of_order = |skier| AuditError::SkierOutOfOrder { seq, skier };

        match line.event {
            Event::BusStarted | Event::SkierStarted(_) => {}
            Event::BusArrived(stop) => {
                check_stop(seq, stop, config)?;
                if !self.on_the_road() {
                    return Err(AuditError::BusOutOfOrder { seq });
                }
                self.bus_at = Some(stop);
            }
            Event::BusArrivedFinal => {
                if !self.on_the_road() {
                    return Err(AuditError::BusOutOfOrder { seq });
                }
                self.at_terminal = true;
            }
            Event::BusLeaving(stop) => {
                if self.bus_at != Some(stop) {
                    return Err(AuditError::BusStopMismatch {
                        seq,
                        left: stop,
                        at: self.bus_at,
                    });
                }
                self.bus_at = None;
            }
            Event::BusLeavingFinal => {
                if !self.at_terminal {
                    return Err(AuditError::BusOutOfOrder { seq });
                }
                if self.aboard != 0 {
                    return Err(AuditError::RidersNotDelivered {
                        seq,
                        aboard: self.aboard,
                    });
                }
                self.at_terminal = false;
                self.report.terminal_visits += 1;
            }
            Event::BusFinished => {
                if !self.on_the_road() {
                    return Err(AuditError::BusOutOfOrder { seq });
                }
                self.finished = true;
            }
            Event::SkierArrived(skier, stop) => {
                check_stop(seq, stop, config)?;
                if self.arrived.insert(skier, stop).is_some() {
                    return Err(out_of_order(skier));
                }
            }
            Event::SkierBoarding(skier) => {
                let waiting_at = *self.arrived.get(&skier).ok_or_else(|| out_of_order(skier))?;
                self.check_bus_at(seq, skier, waiting_at)?;
                if !self.boarded.insert(skier) {
                    return Err(out_of_order(skier));
                }
                self.aboard += 1;
                if self.aboard > capacity {
                    return Err(AuditError::OverCapacity {
                        seq,
                        aboard: self.aboard,
                        capacity,
                    });
                }
                self.report.peak_aboard = self.report.peak_aboard.max(self.aboard);
            }
            Event::SkierLeftBehind(skier, stop) => {
                if self.arrived.get(&skier) != Some(&stop) || self.boarded.contains(&skier) {
                    return Err(out_of_order(skier));
                }
                self.check_bus_at(seq, skier, stop)?;
                if self.aboard < capacity {
                    return Err(AuditError::NeedlessRefusal {
                        seq,
                        skier,
                        aboard: self.aboard,
                        capacity,
                    });
                }
                self.report.left_behind += 1;
            }
            Event::SkierDelivered(skier) => {
                if !self.boarded.contains(&skier) || !self.delivered.insert(skier) {
                    return Err(out_of_order(skier));
                }
                if !self.at_terminal {
                    return Err(AuditError::DeliveredOutsideTerminal { seq, skier });
                }
                self.aboard -= 1;
            }
        }
        Ok(())
    }

    const fn on_the_road(&self) -> bool {
        self.bus_at.is_none() && !self.at_terminal
    }

    fn check_bus_at(&self, seq: u64, skier: SkierId, waiting_at: Stop) -> Result<(), AuditError> {
        if self.bus_at == Some(waiting_at) {
            Ok(())
        } else {
            Err(AuditError::WrongStop {
                seq,
                skier,
                waiting_at,
                bus_at: self.bus_at,
            })
        }
    }
}

fn check_stop(seq: u64, stop: Stop, config: &SimConfig) -> Result<(), AuditError> {
    if (1..=config.stops()).contains(&stop.0) {
        Ok(())
    } else {
        Err(AuditError::UnknownStop { seq, stop })
    }
}
