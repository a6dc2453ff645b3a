//! # Shared State Store
//!
//! Everything the bus and the skiers share, behind two locks:
//!
//! ```text
//!   board lock ──> roster lock ──> (log lock)
//!   ───────────────────────────────────────────
//!   current stop     seats          see crate::log
//!   waiting counts   peak
//!   stop queues
//!   delivered
//! ```
//!
//! Locks are only ever taken left to right. The board lock is an async
//! mutex: the bus holds it for a whole stop visit, including while it awaits
//! boarding acknowledgments. A skier never needs the board lock to react to
//! its admission: it takes its seat under the roster lock, so the handshake
//! cannot deadlock. The roster and log locks are plain mutexes and are never
//! held across an `.await`.
//!
//! ## Admission Handshake
//!
//! ```text
//!   skier                          bus (holding board lock)
//!   ─────                          ────────────────────────
//!   register(stop) ──> queue[stop]
//!   permit.wait() ...              admit_next(stop)
//!                 <── Admission ── pops FIFO, sends stop + ack channel
//!   take_seat()
//!   acknowledge(ack) ──> Ack ────> handshake.wait()
//! ```
//!
//! Each waiter owns its own oneshot permit and the stop queue is FIFO, so a
//! permit can only ever reach a skier waiting at the stop the bus is at.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::{oneshot, MutexGuard};

use crate::config::SimConfig;
use crate::error::{ConfigError, ProtocolViolation, SimError, SimResult};
use crate::types::{SkierId, Stop};

// =============================================================================
// HANDSHAKE MESSAGES
// =============================================================================

/// A skier's answer to its admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// The skier took a seat.
    Boarded(SkierId),
    /// The bus was full; the skier will wait again.
    LeftBehind(SkierId),
}

impl Ack {
    /// Who answered.
    #[must_use]
    pub const fn skier(self) -> SkierId {
        match self {
            Self::Boarded(id) | Self::LeftBehind(id) => id,
        }
    }
}

/// Permission to try boarding, sent while the bus is at `stop`.
#[derive(Debug)]
pub struct Admission {
    stop: Stop,
    ack: oneshot::Sender<Ack>,
}

impl Admission {
    /// Tells the bus this skier is done reacting.
    ///
    /// # Errors
    ///
    /// [`SimError::Aborted`] if the bus is gone.
    pub fn acknowledge(self, ack: Ack) -> SimResult<()> {
        self.ack.send(ack).map_err(|_| SimError::Aborted)
    }
}

/// A skier's place in a stop queue.
#[derive(Debug)]
pub struct Permit {
    skier: SkierId,
    stop: Stop,
    admission: oneshot::Receiver<Admission>,
}

impl Permit {
    /// Parks until the bus admits this skier.
    ///
    /// # Errors
    ///
    /// [`SimError::Aborted`] if the store was dropped while waiting, or
    /// [`ProtocolViolation::WrongStop`] if the admission names another stop.
    pub async fn wait(self) -> SimResult<Admission> {
        let admission = self.admission.await.map_err(|_| SimError::Aborted)?;
        if admission.stop != self.stop {
            return Err(ProtocolViolation::WrongStop {
                skier: self.skier,
                waiting_at: self.stop,
                admitted_at: admission.stop,
            }
            .into());
        }
        Ok(admission)
    }
}

/// The bus side of one admission.
#[derive(Debug)]
pub struct Handshake {
    skier: SkierId,
    ack: oneshot::Receiver<Ack>,
}

impl Handshake {
    /// Skier that was admitted.
    #[must_use]
    pub const fn skier(&self) -> SkierId {
        self.skier
    }

    /// Waits until the admitted skier acknowledges.
    ///
    /// # Errors
    ///
    /// The skier vanished, or a different skier answered.
    pub async fn wait(self) -> SimResult<Ack> {
        let ack = self
            .ack
            .await
            .map_err(|_| ProtocolViolation::AckLost(self.skier))?;
        if ack.skier() != self.skier {
            return Err(ProtocolViolation::AckMismatch {
                expected: self.skier,
                got: ack.skier(),
            }
            .into());
        }
        Ok(ack)
    }
}

#[derive(Debug)]
struct Waiter {
    skier: SkierId,
    permit: oneshot::Sender<Admission>,
}

// =============================================================================
// BOARD (bus position, queues, deliveries)
// =============================================================================

/// State guarded by the board lock.
#[derive(Debug)]
pub struct Board {
    stops: u8,
    current_stop: Stop,
    /// Skiers waiting per stop; slot 0 unused.
    waiting: Vec<usize>,
    /// Permit senders in arrival order; slot 0 unused.
    queues: Vec<VecDeque<Waiter>>,
    delivered: u32,
}

impl Board {
    fn new(stops: u8) -> Self {
        let slots = usize::from(stops) + 1;
        Self {
            stops,
            current_stop: Stop::FIRST,
            waiting: vec![0; slots],
            queues: (0..slots).map(|_| VecDeque::new()).collect(),
            delivered: 0,
        }
    }

    /// Stop the bus occupies.
    #[inline]
    #[must_use]
    pub const fn current_stop(&self) -> Stop {
        self.current_stop
    }

    /// Skiers currently waiting at `stop`.
    #[must_use]
    pub fn waiting_at(&self, stop: Stop) -> usize {
        self.waiting[stop.index()]
    }

    /// Total skiers delivered so far.
    #[inline]
    #[must_use]
    pub const fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Releases the permit of the longest-waiting skier at `stop`.
    ///
    /// Does not touch the waiting count; the bus settles it once with
    /// [`Board::release_waiting`] after the whole visit.
    ///
    /// # Errors
    ///
    /// The queue is empty, or its skier stopped listening.
    pub fn admit_next(&mut self, stop: Stop) -> SimResult<Handshake> {
        let waiter = self.queues[stop.index()]
            .pop_front()
            .ok_or(ProtocolViolation::MissingWaiter(stop))?;

        let (ack_tx, ack_rx) = oneshot::channel();
        waiter
            .permit
            .send(Admission { stop, ack: ack_tx })
            .map_err(|_| ProtocolViolation::PermitLost(waiter.skier))?;

        Ok(Handshake {
            skier: waiter.skier,
            ack: ack_rx,
        })
    }

    /// Removes `admitted` skiers from the waiting count at `stop`.
    ///
    /// # Errors
    ///
    /// [`ProtocolViolation::NegativeWaiting`] if the count would underflow.
    pub fn release_waiting(&mut self, stop: Stop, admitted: usize) -> SimResult<()> {
        let waiting = self.waiting[stop.index()];
        self.waiting[stop.index()] =
            waiting
                .checked_sub(admitted)
                .ok_or(ProtocolViolation::NegativeWaiting {
                    stop,
                    waiting,
                    admitted,
                })?;
        Ok(())
    }

    fn enqueue(&mut self, waiter: Waiter, stop: Stop) {
        self.waiting[stop.index()] += 1;
        self.queues[stop.index()].push_back(waiter);
    }
}

// =============================================================================
// ROSTER (who is aboard)
// =============================================================================

/// Result of trying to take a seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seat {
    /// Seated; the value is the roster length after boarding.
    Taken(usize),
    /// Every seat was occupied.
    Full,
}

#[derive(Debug)]
struct Roster {
    seats: Vec<SkierId>,
    capacity: usize,
    peak: usize,
}

/// Result of moving the bus one position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The bus moved on to this stop.
    Next(Stop),
    /// The bus passed the last stop; these skiers got off, in boarding order.
    Terminal(Vec<SkierId>),
}

/// Point-in-time copy of the store, for tests and reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSnapshot {
    /// Stop the bus occupies.
    pub current_stop: Stop,
    /// Waiting counts, index = stop number (slot 0 unused).
    pub waiting: Vec<usize>,
    /// Skiers aboard, in boarding order.
    pub boarded: Vec<SkierId>,
    /// Largest roster seen.
    pub peak_boarded: usize,
    /// Skiers delivered.
    pub delivered: u32,
}

// =============================================================================
// STORE
// =============================================================================

/// Shared state of one simulation run.
#[derive(Debug)]
pub struct SharedState {
    config: SimConfig,
    board: tokio::sync::Mutex<Board>,
    roster: Mutex<Roster>,
}

impl SharedState {
    /// Zeroed store with the bus at stop 1.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            board: tokio::sync::Mutex::new(Board::new(config.stops())),
            roster: Mutex::new(Roster {
                seats: Vec::with_capacity(config.capacity()),
                capacity: config.capacity(),
                peak: 0,
            }),
            config,
        }
    }

    /// Run configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Counts `skier` as waiting at `stop` and queues its permit.
    ///
    /// Waits while the bus is admitting anywhere.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if `stop` is outside `1..=stops`.
    pub async fn register(&self, skier: SkierId, stop: Stop) -> SimResult<Permit> {
        let stops = self.config.stops();
        if !(1..=stops).contains(&stop.0) {
            return Err(ConfigError::OutOfRange {
                name: "stop",
                value: u64::from(stop.0),
                min: 1,
                max: u64::from(stops),
            }
            .into());
        }

        let (tx, rx) = oneshot::channel();
        self.board
            .lock()
            .await
            .enqueue(Waiter { skier, permit: tx }, stop);

        Ok(Permit {
            skier,
            stop,
            admission: rx,
        })
    }

    /// Exclusive access to the board for one stop visit.
    pub async fn lock_board(&self) -> MutexGuard<'_, Board> {
        self.board.lock().await
    }

    /// Puts `skier` on the bus if a seat is free.
    ///
    /// # Errors
    ///
    /// [`ProtocolViolation::RosterOverflow`] if the roster is already past
    /// capacity.
    pub fn take_seat(&self, skier: SkierId) -> SimResult<Seat> {
        let mut roster = self.roster.lock();
        let boarded = roster.seats.len();
        if boarded > roster.capacity {
            return Err(ProtocolViolation::RosterOverflow {
                boarded,
                capacity: roster.capacity,
            }
            .into());
        }
        if boarded == roster.capacity {
            return Ok(Seat::Full);
        }

        roster.seats.push(skier);
        roster.peak = roster.peak.max(boarded + 1);
        Ok(Seat::Taken(boarded + 1))
    }

    /// Moves the bus to the next position.
    ///
    /// Past the last stop the roster is emptied into the delivered count and
    /// the bus returns to stop 1.
    pub async fn advance(&self) -> Advance {
        let mut board = self.board.lock().await;
        let next = board.current_stop.0 + 1;
        if next <= board.stops {
            board.current_stop = Stop(next);
            return Advance::Next(board.current_stop);
        }

        let riders: Vec<SkierId> = self.roster.lock().seats.drain(..).collect();
        board.delivered += riders.len() as u32;
        board.current_stop = Stop::FIRST;
        Advance::Terminal(riders)
    }

    /// Skiers delivered so far.
    pub async fn delivered(&self) -> u32 {
        self.board.lock().await.delivered()
    }

    /// True once every skier has been delivered.
    pub async fn all_delivered(&self) -> bool {
        self.delivered().await >= self.config.skiers()
    }

    /// Largest roster seen so far.
    #[must_use]
    pub fn peak_boarded(&self) -> usize {
        self.roster.lock().peak
    }

    /// Copies the whole store.
    pub async fn snapshot(&self) -> StoreSnapshot {
        let board = self.board.lock().await;
        let roster = self.roster.lock();
        StoreSnapshot {
            current_stop: board.current_stop,
            waiting: board.waiting.clone(),
            boarded: roster.seats.clone(),
            peak_boarded: roster.peak,
            delivered: board.delivered,
        }
    }
}
