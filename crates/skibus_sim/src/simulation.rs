//! # Orchestrator
//!
//! Spawns the bus and one task per skier on a multi-thread runtime, then
//! joins every one of them before the shared state is dropped.
//!
//! ## Failure Handling
//!
//! Nothing is retried. A worker that returns an error, or is dropped while
//! still armed, reports to a supervisor task, which cancels every other
//! worker. Cancelled workers join as [`SimError::Aborted`]. The orchestrator
//! always drains all spawned tasks, then reports the most specific error it
//! saw.
//!
//! Release and dev builds set `panic = "abort"`, so there a panicking worker
//! ends the process. Only unwinding builds (the test harness) ever report
//! [`SimError::WorkerPanicked`].

use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{AbortHandle, JoinHandle};

use skibus_core::{
    ConfigError, EventLog, SharedState, SimConfig, SimError, SimResult, SkierId, Stop,
};

use crate::bus::Bus;
use crate::report::{RunReport, SkierReport};
use crate::skier::{Skier, StopPolicy};

/// One simulation run.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimConfig,
    seed: u64,
    policy: StopPolicy,
}

impl Simulation {
    /// Run with uniform stop choice and a clock-derived seed.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64);
        Self {
            config,
            seed,
            policy: StopPolicy::Uniform,
        }
    }

    /// Fixes the seed for stop choice and pauses.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Replaces the stop policy.
    #[must_use]
    pub const fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed the run will use.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs to completion on a fresh runtime, writing events to `log`.
    ///
    /// Must not be called from inside another runtime; use
    /// [`Simulation::run_async`] there.
    ///
    /// # Errors
    ///
    /// The runtime could not start, or see [`Simulation::run_async`].
    pub fn run<W>(&self, log: Arc<EventLog<W>>) -> SimResult<RunReport>
    where
        W: Write + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_time()
            .thread_name("skibus-worker")
            .build()
            .map_err(|source| SimError::Spawn {
                role: "runtime".to_string(),
                source,
            })?;
        runtime.block_on(self.run_async(log))
    }

    /// Runs to completion on the current runtime, writing events to `log`.
    ///
    /// # Errors
    ///
    /// A fixed stop outside the configured range, a failed log write, a
    /// protocol violation or a panicked worker.
    pub async fn run_async<W>(&self, log: Arc<EventLog<W>>) -> SimResult<RunReport>
    where
        W: Write + Send + 'static,
    {
        if let StopPolicy::Fixed(Stop(stop)) = self.policy {
            if !(1..=self.config.stops()).contains(&stop) {
                return Err(ConfigError::OutOfRange {
                    name: "stop",
                    value: u64::from(stop),
                    min: 1,
                    max: u64::from(self.config.stops()),
                }
                .into());
            }
        }

        let start = Instant::now();
        let state = Arc::new(SharedState::new(self.config));
        tracing::info!(
            skiers = self.config.skiers(),
            stops = self.config.stops(),
            capacity = self.config.capacity(),
            seed = self.seed,
            "simulation started"
        );

        let (failure_tx, failure_rx) = mpsc::unbounded_channel();
        let bus = Bus::new(Arc::clone(&state), Arc::clone(&log), self.seed);
        let bus_worker = spawn_worker("bus".to_string(), &failure_tx, bus.run());

        let mut skier_workers = Vec::with_capacity(self.config.skiers() as usize);
        for id in 1..=self.config.skiers() {
            let skier = Skier::new(
                SkierId(id),
                Arc::clone(&state),
                Arc::clone(&log),
                self.policy,
                self.seed,
            );
            skier_workers.push(spawn_worker(format!("skier-{id}"), &failure_tx, skier.run()));
        }
        drop(failure_tx);
        tracing::debug!(spawned = skier_workers.len(), "skiers spawned");

        let handles = std::iter::once(bus_worker.handle.abort_handle())
            .chain(skier_workers.iter().map(|w| w.handle.abort_handle()))
            .collect();
        let supervisor = supervise(failure_rx, handles);

        // Drain before teardown: every task is joined, whatever happened.
        let mut failures = Vec::new();
        let bus_report = match join(bus_worker).await {
            Ok(report) => Some(report),
            Err(err) => {
                failures.push(err);
                None
            }
        };
        let mut skier_reports: Vec<SkierReport> = Vec::with_capacity(skier_workers.len());
        for worker in skier_workers {
            match join(worker).await {
                Ok(report) => skier_reports.push(report),
                Err(err) => failures.push(err),
            }
        }
        if supervisor.await.is_err() {
            failures.push(SimError::WorkerPanicked {
                name: "supervisor".to_string(),
            });
        }

        if let Some(err) = most_specific(failures) {
            tracing::warn!(error = %err, "simulation failed");
            return Err(err);
        }
        let bus = bus_report.ok_or(SimError::Aborted)?;

        let report = RunReport {
            seed: self.seed,
            delivered: state.delivered().await,
            elapsed: start.elapsed(),
            log_lines: log.len(),
            bus,
            skiers_left_behind: skier_reports.iter().filter(|r| r.admissions > 1).count() as u32,
        };
        tracing::info!(%report, "simulation finished");
        Ok(report)
    }
}

/// Reports a failure unless disarmed; fires on error, on cancellation and
/// on unwinding. Under `panic = "abort"` a panic never reaches it.
struct FailureGuard {
    failures: UnboundedSender<()>,
    armed: bool,
}

impl Drop for FailureGuard {
    fn drop(&mut self) {
        if self.armed {
            // The supervisor is gone once it has cancelled everyone.
            let _ = self.failures.send(());
        }
    }
}

struct Worker<T> {
    name: String,
    handle: JoinHandle<SimResult<T>>,
}

fn spawn_worker<T, F>(name: String, failures: &UnboundedSender<()>, body: F) -> Worker<T>
where
    T: Send + 'static,
    F: Future<Output = SimResult<T>> + Send + 'static,
{
    let failures = failures.clone();
    let handle = tokio::spawn(async move {
        let mut guard = FailureGuard {
            failures,
            armed: true,
        };
        let result = body.await;
        guard.armed = result.is_err();
        result
    });
    Worker { name, handle }
}

/// Cancels every worker on the first reported failure. Ends once all
/// workers have finished without one.
fn supervise(mut failures: UnboundedReceiver<()>, workers: Vec<AbortHandle>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if failures.recv().await.is_some() {
            tracing::debug!(workers = workers.len(), "worker failed, cancelling the run");
            for worker in &workers {
                worker.abort();
            }
        }
    })
}

async fn join<T>(worker: Worker<T>) -> SimResult<T> {
    match worker.handle.await {
        Ok(result) => result,
        Err(err) if err.is_cancelled() => Err(SimError::Aborted),
        Err(_) => Err(SimError::WorkerPanicked { name: worker.name }),
    }
}

/// Picks the root cause: knock-on aborts rank lowest, protocol violations
/// below everything that can cause one.
fn most_specific(failures: Vec<SimError>) -> Option<SimError> {
    fn rank(err: &SimError) -> u8 {
        match err {
            SimError::Aborted => 0,
            SimError::Protocol(_) => 1,
            _ => 2,
        }
    }

    let mut best: Option<SimError> = None;
    for err in failures {
        if best.as_ref().map_or(true, |b| rank(&err) > rank(b)) {
            best = Some(err);
        }
    }
    best
}
