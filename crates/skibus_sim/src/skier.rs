//! # Skier Worker
//!
//! One per skier. Lifecycle:
//!
//! ```text
//!   started ─> walk ─> arrived(k) ─> register ─> wait for admission
//!                                       ^                │
//!                                       │          take a seat?
//!                                       │           │        │
//!                                 left behind <─ full     boarding ─> ack ─> done
//! ```
//!
//! A skier is only ever counted as waiting at the stop it chose. The bus
//! removes it from the waiting count, never the skier itself. Only the first
//! refusal goes to the run log; later ones are traced.

use std::io::Write;
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use skibus_core::{Ack, Event, EventLog, Seat, SharedState, SimResult, SkierId, Stop};

use crate::pace;
use crate::report::SkierReport;

/// How skiers pick their stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StopPolicy {
    /// Uniformly random over `1..=stops`.
    #[default]
    Uniform,
    /// Every skier waits at the same stop.
    Fixed(Stop),
}

impl StopPolicy {
    /// Picks a stop in `1..=stops`.
    pub fn choose(self, rng: &mut ChaCha8Rng, stops: u8) -> Stop {
        match self {
            Self::Uniform => Stop(rng.gen_range(1..=stops)),
            Self::Fixed(stop) => stop,
        }
    }
}

/// A single skier task body.
pub struct Skier<W: Write> {
    id: SkierId,
    state: Arc<SharedState>,
    log: Arc<EventLog<W>>,
    policy: StopPolicy,
    rng: ChaCha8Rng,
}

impl<W: Write> Skier<W> {
    /// Skier `id`, drawing from its own stream of the run seed.
    pub fn new(
        id: SkierId,
        state: Arc<SharedState>,
        log: Arc<EventLog<W>>,
        policy: StopPolicy,
        seed: u64,
    ) -> Self {
        Self {
            id,
            state,
            log,
            policy,
            rng: pace::stream(seed, u64::from(id.0)),
        }
    }

    /// Runs the skier until it is seated and acknowledged.
    ///
    /// # Errors
    ///
    /// The log failed, the run was aborted, or an admission named the wrong
    /// stop.
    pub async fn run(mut self) -> SimResult<SkierReport> {
        let id = self.id;
        let config = *self.state.config();

        self.log.emit(Event::SkierStarted(id))?;
        pace::pause(&mut self.rng, config.max_wait_us()).await;

        let stop = self.policy.choose(&mut self.rng, config.stops());
        self.log.emit(Event::SkierArrived(id, stop))?;

        let mut permit = self.state.register(id, stop).await?;
        let mut admissions = 0;
        loop {
            let admission = permit.wait().await?;
            admissions += 1;

            match self.state.take_seat(id)? {
                Seat::Taken(_) => {
                    self.log.emit(Event::SkierBoarding(id))?;
                    admission.acknowledge(Ack::Boarded(id))?;
                    return Ok(SkierReport {
                        id,
                        stop,
                        admissions,
                    });
                }
                Seat::Full => {
                    if admissions == 1 {
                        self.log.emit(Event::SkierLeftBehind(id, stop))?;
                    } else {
                        tracing::trace!(skier = id.0, stop = stop.0, admissions, "left behind again");
                    }
                    admission.acknowledge(Ack::LeftBehind(id))?;
                    // Waits until the bus has finished this visit.
                    permit = self.state.register(id, stop).await?;
                }
            }
        }
    }
}
