//! # SKIBUS Core
//!
//! Shared pieces of the ski shuttle simulation: one bus ferrying skiers from
//! numbered stops to the resort, with every skier and the bus running as
//! their own task.
//!
//! ## Contents
//!
//! - [`SimConfig`]: validated run parameters
//! - [`SharedState`]: waiting counts, stop queues, roster, deliveries
//! - [`EventLog`]: the numbered run log
//! - [`audit`]: offline verification of a finished log
//!
//! ## Lock Discipline
//!
//! 1. **Board lock, then roster lock** - never the other way round
//! 2. **Log lock is a leaf** - nothing is locked while holding it
//! 3. **No lock across a permit wait** - a parked skier holds nothing
//! 4. **Only the board lock spans an `.await`** - roster and log locks are sync
//!
//! ## Example
//!
//! ```rust,ignore
//! use skibus_core::{EventLog, SharedState, SimConfig};
//!
//! let config = SimConfig::from_args(&["100", "5", "20", "1000", "500"])?;
//! let state = SharedState::new(config);
//! let log = EventLog::create("skibus.out")?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod log;
pub mod state;
pub mod types;

pub use audit::{audit, AuditError, AuditReport};
pub use config::SimConfig;
pub use error::{ConfigError, ProtocolViolation, SimError, SimResult};
pub use event::{Event, LogLine, ParseEventError};
pub use log::EventLog;
pub use state::{
    Ack, Admission, Advance, Board, Handshake, Permit, Seat, SharedState, StoreSnapshot,
};
pub use types::{SkierId, Stop};
