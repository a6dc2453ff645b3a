//! # Transport Process
//!
//! The single bus. One loop iteration is one stop visit:
//!
//! 1. drive (random pause, no lock held)
//! 2. take the board lock, log the arrival
//! 3. snapshot `w = waiting[k]`, admit exactly `w` skiers in FIFO order,
//!    waiting for each acknowledgment before the next admission
//! 4. settle `waiting[k] -= w`, release the lock, log the departure
//! 5. advance; past the last stop, deliver the whole roster and go back to 1
//!
//! The loop ends once the delivered count reaches the number of skiers.
//! Skiers that arrive during a visit wait for the next one, so every visit
//! is a single bounded pass.

use std::io::Write;
use std::sync::Arc;

use rand_chacha::ChaCha8Rng;

use skibus_core::{Ack, Advance, Event, EventLog, SharedState, SimResult, Stop};

use crate::pace;
use crate::report::BusReport;

/// The bus task body.
pub struct Bus<W: Write> {
    state: Arc<SharedState>,
    log: Arc<EventLog<W>>,
    rng: ChaCha8Rng,
    report: BusReport,
}

impl<W: Write> Bus<W> {
    /// Bus drawing drive times from stream 0 of the run seed.
    pub fn new(state: Arc<SharedState>, log: Arc<EventLog<W>>, seed: u64) -> Self {
        Self {
            state,
            log,
            rng: pace::stream(seed, 0),
            report: BusReport::default(),
        }
    }

    /// Drives until every skier has been delivered.
    ///
    /// # Errors
    ///
    /// The log failed or a protocol invariant broke.
    pub async fn run(mut self) -> SimResult<BusReport> {
        let max_drive_us = self.state.config().max_drive_us();
        self.log.emit(Event::BusStarted)?;

        while !self.state.all_delivered().await {
            pace::pause(&mut self.rng, max_drive_us).await;
            let stop = self.visit().await?;
            self.depart(stop).await?;
        }

        self.log.emit(Event::BusFinished)?;
        self.report.peak_boarded = self.state.peak_boarded();
        tracing::info!(
            loops = self.report.terminal_visits,
            delivered = self.report.delivered,
            "bus finished"
        );
        Ok(self.report)
    }

    /// Arrives at the current stop and admits everyone waiting there.
    ///
    /// Returns with the board lock released.
    ///
    /// # Errors
    ///
    /// See [`Bus::run`].
    pub async fn visit(&mut self) -> SimResult<Stop> {
        let mut board = self.state.lock_board().await;
        let stop = board.current_stop();
        self.log.emit(Event::BusArrived(stop))?;

        let waiting = board.waiting_at(stop);
        for _ in 0..waiting {
            let handshake = board.admit_next(stop)?;
            self.report.admissions += 1;
            match handshake.wait().await? {
                Ack::Boarded(_) => self.report.boarded += 1,
                Ack::LeftBehind(_) => self.report.left_behind += 1,
            }
        }
        board.release_waiting(stop, waiting)?;
        drop(board);

        self.report.stop_visits += 1;
        Ok(stop)
    }

    /// Leaves `stop` and moves on, delivering at the terminal.
    ///
    /// # Errors
    ///
    /// The log failed.
    pub async fn depart(&mut self, stop: Stop) -> SimResult<()> {
        self.log.emit(Event::BusLeaving(stop))?;

        if let Advance::Terminal(riders) = self.state.advance().await {
            self.log.emit(Event::BusArrivedFinal)?;
            for &skier in &riders {
                self.log.emit(Event::SkierDelivered(skier))?;
            }
            self.log.emit(Event::BusLeavingFinal)?;

            self.report.terminal_visits += 1;
            self.report.delivered += riders.len() as u64;
            tracing::debug!(riders = riders.len(), "terminal reached");
        }
        Ok(())
    }

    /// Counters so far.
    #[must_use]
    pub const fn report(&self) -> &BusReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skibus_core::{ProtocolViolation, SimConfig, SimError, SkierId};

    fn setup(skiers: u32, stops: u8) -> (Arc<SharedState>, Arc<EventLog<Vec<u8>>>) {
        let config = SimConfig::new(skiers, stops, 10, 0, 0).unwrap();
        (
            Arc::new(SharedState::new(config)),
            Arc::new(EventLog::in_memory()),
        )
    }

    #[tokio::test]
    async fn test_empty_stop_visit() {
        let (state, log) = setup(1, 2);
        let mut bus = Bus::new(Arc::clone(&state), Arc::clone(&log), 0);

        let stop = bus.visit().await.unwrap();
        bus.depart(stop).await.unwrap();

        assert_eq!(stop, Stop(1));
        assert_eq!(state.snapshot().await.current_stop, Stop(2));
        assert_eq!(bus.report().admissions, 0);
        assert_eq!(log.lines(), vec!["1: BUS: arrived to 1", "2: BUS: leaving 1"]);
    }

    #[tokio::test]
    async fn test_visit_admits_snapshot_and_settles_count() {
        let (state, log) = setup(2, 1);
        let mut responders = Vec::new();
        for id in 1..=2 {
            let permit = state.register(SkierId(id), Stop(1)).await.unwrap();
            let state = Arc::clone(&state);
            responders.push(tokio::spawn(async move {
                let admission = permit.wait().await.unwrap();
                state.take_seat(SkierId(id)).unwrap();
                admission.acknowledge(Ack::Boarded(SkierId(id))).unwrap();
            }));
        }

        let mut bus = Bus::new(Arc::clone(&state), Arc::clone(&log), 0);
        let stop = bus.visit().await.unwrap();
        for r in responders {
            r.await.unwrap();
        }

        assert_eq!(bus.report().admissions, 2);
        assert_eq!(bus.report().boarded, 2);
        assert_eq!(state.snapshot().await.waiting, vec![0, 0]);

        bus.depart(stop).await.unwrap();
        assert_eq!(bus.report().delivered, 2);
        assert!(state.all_delivered().await);
        let lines = log.lines();
        assert_eq!(lines[0], "1: BUS: arrived to 1");
        assert_eq!(lines[2], "3: BUS: arrived to final");
        assert_eq!(lines[5], "6: BUS: leaving final");
    }

    #[tokio::test]
    async fn test_visit_fails_when_waiter_is_gone() {
        let (state, log) = setup(1, 1);
        drop(state.register(SkierId(1), Stop(1)).await.unwrap());

        let mut bus = Bus::new(state, log, 0);
        assert!(matches!(
            bus.visit().await.unwrap_err(),
            SimError::Protocol(ProtocolViolation::PermitLost(SkierId(1)))
        ));
    }
}
