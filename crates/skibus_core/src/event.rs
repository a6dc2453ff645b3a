//! # Event Vocabulary
//!
//! Everything that reaches the run log. Each event renders to one line body
//! and parses back from it, so a finished log can be audited.
//!
//! ```text
//! 1: BUS: started
//! 2: L 1: started
//! 3: L 1: arrived to 2
//! 4: BUS: arrived to 1
//! 5: BUS: leaving 1
//! 6: BUS: arrived to 2
//! 7: L 1: boarding
//! 8: BUS: leaving 2
//! 9: BUS: arrived to final
//! 10: L 1: going to ski
//! 11: BUS: leaving final
//! 12: BUS: finish
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::{SkierId, Stop};

/// A single log event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// The transport process is running.
    BusStarted,
    /// The bus pulled into a stop and holds the store lock.
    BusArrived(Stop),
    /// The bus finished admitting at a stop.
    BusLeaving(Stop),
    /// The bus passed the last stop and is at the resort.
    BusArrivedFinal,
    /// Everyone aboard was delivered.
    BusLeavingFinal,
    /// Every skier has been delivered.
    BusFinished,
    /// A skier thread started walking to its stop.
    SkierStarted(SkierId),
    /// A skier reached its stop and is about to wait.
    SkierArrived(SkierId, Stop),
    /// A skier took a seat.
    SkierBoarding(SkierId),
    /// A skier was admitted while the bus was full and waits again.
    SkierLeftBehind(SkierId, Stop),
    /// A skier got off at the resort.
    SkierDelivered(SkierId),
}

impl Event {
    /// The skier this event is about, if any.
    #[must_use]
    pub const fn skier(&self) -> Option<SkierId> {
        match *self {
            Self::SkierStarted(id)
            | Self::SkierArrived(id, _)
            | Self::SkierBoarding(id)
            | Self::SkierLeftBehind(id, _)
            | Self::SkierDelivered(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusStarted => f.write_str("BUS: started"),
            Self::BusArrived(stop) => write!(f, "BUS: arrived to {stop}"),
            Self::BusLeaving(stop) => write!(f, "BUS: leaving {stop}"),
            Self::BusArrivedFinal => f.write_str("BUS: arrived to final"),
            Self::BusLeavingFinal => f.write_str("BUS: leaving final"),
            Self::BusFinished => f.write_str("BUS: finish"),
            Self::SkierStarted(id) => write!(f, "L {id}: started"),
            Self::SkierArrived(id, stop) => write!(f, "L {id}: arrived to {stop}"),
            Self::SkierBoarding(id) => write!(f, "L {id}: boarding"),
            Self::SkierLeftBehind(id, stop) => write!(f, "L {id}: left behind at {stop}"),
            Self::SkierDelivered(id) => write!(f, "L {id}: going to ski"),
        }
    }
}

/// A line that is not part of the event vocabulary.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("unrecognised log line: {0:?}")]
pub struct ParseEventError(pub String);

impl FromStr for Event {
    type Err = ParseEventError;

    fn from_str(body: &str) -> Result<Self, Self::Err> {
        let bad = || ParseEventError(body.to_string());

        if let Some(rest) = body.strip_prefix("BUS: ") {
            return match rest {
                "started" => Ok(Self::BusStarted),
                "arrived to final" => Ok(Self::BusArrivedFinal),
                "leaving final" => Ok(Self::BusLeavingFinal),
                "finish" => Ok(Self::BusFinished),
                _ => {
                    if let Some(stop) = rest.strip_prefix("arrived to ") {
                        stop.parse().map(|s| Self::BusArrived(Stop(s))).map_err(|_| bad())
                    } else if let Some(stop) = rest.strip_prefix("leaving ") {
                        stop.parse().map(|s| Self::BusLeaving(Stop(s))).map_err(|_| bad())
                    } else {
                        Err(bad())
                    }
                }
            };
        }

        let rest = body.strip_prefix("L ").ok_or_else(bad)?;
        let (id, what) = rest.split_once(": ").ok_or_else(bad)?;
        let id = SkierId(id.parse().map_err(|_| bad())?);

        match what {
            "started" => Ok(Self::SkierStarted(id)),
            "boarding" => Ok(Self::SkierBoarding(id)),
            "going to ski" => Ok(Self::SkierDelivered(id)),
            _ => {
                if let Some(stop) = what.strip_prefix("arrived to ") {
                    stop.parse().map(|s| Self::SkierArrived(id, Stop(s))).map_err(|_| bad())
                } else if let Some(stop) = what.strip_prefix("left behind at ") {
                    stop.parse().map(|s| Self::SkierLeftBehind(id, Stop(s))).map_err(|_| bad())
                } else {
                    Err(bad())
                }
            }
        }
    }
}

/// A numbered line of the run log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Sequence number, starting at 1.
    pub seq: u64,
    /// What happened.
    pub event: Event,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.seq, self.event)
    }
}

impl FromStr for LogLine {
    type Err = ParseEventError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (seq, body) = line
            .split_once(": ")
            .ok_or_else(|| ParseEventError(line.to_string()))?;
        let seq = seq
            .trim()
            .parse()
            .map_err(|_| ParseEventError(line.to_string()))?;
        Ok(Self {
            seq,
            event: body.trim_end().parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_lines() {
        assert_eq!(Event::BusArrived(Stop(3)).to_string(), "BUS: arrived to 3");
        assert_eq!(Event::BusLeaving(Stop(3)).to_string(), "BUS: leaving 3");
        assert_eq!(Event::BusFinished.to_string(), "BUS: finish");
        assert_eq!("BUS: arrived to final".parse(), Ok(Event::BusArrivedFinal));
    }

    #[test]
    fn test_skier_lines() {
        assert_eq!(
            Event::SkierArrived(SkierId(17), Stop(2)).to_string(),
            "L 17: arrived to 2"
        );
        assert_eq!(
            "L 17: going to ski".parse(),
            Ok(Event::SkierDelivered(SkierId(17)))
        );
        assert_eq!(
            "L 4: left behind at 9".parse(),
            Ok(Event::SkierLeftBehind(SkierId(4), Stop(9)))
        );
    }

    #[test]
    fn test_numbered_line() {
        let line: LogLine = "42: L 7: boarding\n".parse().unwrap();
        assert_eq!(line.seq, 42);
        assert_eq!(line.event, Event::SkierBoarding(SkierId(7)));
        assert_eq!(line.to_string(), "42: L 7: boarding");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!("BUS: teleported".parse::<Event>().is_err());
        assert!("L x: boarding".parse::<Event>().is_err());
        assert!("L 3 boarding".parse::<Event>().is_err());
        assert!("no number here".parse::<LogLine>().is_err());
    }
}
