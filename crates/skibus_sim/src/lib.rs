//! # SKIBUS Sim
//!
//! The boarding protocol, one task per participant.
//!
//! ## Participants
//!
//! - [`Skier`]: walks to a stop, waits for an admission, boards or waits
//!   again when the bus is full
//! - [`Bus`]: visits stops round-robin, admits exactly the skiers waiting
//!   when it arrived, delivers everyone at the terminal
//! - [`Simulation`]: spawns the bus and every skier, aborts on the first
//!   failure, joins all tasks before returning
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use skibus_core::{EventLog, SimConfig};
//! use skibus_sim::Simulation;
//!
//! let config = SimConfig::new(100, 5, 20, 1000, 500)?;
//! let log = Arc::new(EventLog::create("skibus.out")?);
//! let report = Simulation::new(config).with_seed(7).run(log)?;
//! assert_eq!(report.delivered, 100);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod bus;
mod pace;
pub mod report;
pub mod simulation;
pub mod skier;

pub use bus::Bus;
pub use report::{BusReport, RunReport, SkierReport};
pub use simulation::Simulation;
pub use skier::{Skier, StopPolicy};
