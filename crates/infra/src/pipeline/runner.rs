use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use shelfwatch_catalog::Catalog;

use crate::config::PipelineConfig;
use crate::ledger::SalesLedger;
use crate::read_model::AlertStore;
use crate::simulation::{Forecaster, SimulationError, Simulator};

use super::retry::POLL_SLICE;
use super::supervisor::supervise;

/// Pipeline runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub ticks: u64,
    pub alerts_emitted: u64,
    pub ticks_abandoned: u64,
    pub forecast_cycles: u64,
    pub forecast_failures: u64,
    pub restarts: u64,
}

type SharedStats = Arc<Mutex<PipelineStats>>;

const MIN_TICK: Duration = Duration::from_millis(1);

fn record(stats: &SharedStats, update: impl FnOnce(&mut PipelineStats)) {
    update(&mut stats.lock().unwrap_or_else(PoisonError::into_inner));
}

/// Handle for a running pipeline (shutdown, stats, trigger hook).
#[derive(Debug)]
pub struct PipelineHandle {
    shutdown: Arc<AtomicBool>,
    trigger: mpsc::SyncSender<()>,
    stats: SharedStats,
    joins: Vec<thread::JoinHandle<()>>,
}

impl PipelineHandle {
    /// Ask the forecaster for a retrain. Coalesced with any pending request.
    pub fn trigger_retrain(&self) {
        let _ = self.trigger.try_send(());
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst) && self.joins.iter().any(|j| !j.is_finished())
    }

    /// Gracefully stop both workers and wait for them to exit.
    pub fn shutdown(mut self) -> PipelineStats {
        self.shutdown.store(true, Ordering::SeqCst);
        for join in self.joins.drain(..) {
            let _ = join.join();
        }
        self.stats()
    }
}

/// Dropping the handle without [`PipelineHandle::shutdown`] still stops the
/// workers; it just doesn't wait for them.
impl Drop for PipelineHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Supervised simulator + forecaster workers.
///
/// - Simulator: ticks every `tick_interval` on a stable cadence, then fires a
///   coalescing trigger (capacity 1) at the forecaster.
/// - Forecaster: retrains whenever triggered; slow retrains absorb triggers
///   instead of queueing them, so the simulator is never blocked.
/// - Each worker runs under [`supervise`]: a crashed worker is replaced after
///   `restart_backoff`, one incarnation at a time.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    config: PipelineConfig,
}

impl PipelineRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn spawn<L>(
        &self,
        catalog: Arc<Catalog>,
        ledger: L,
        store: Arc<AlertStore>,
    ) -> PipelineHandle
    where
        L: SalesLedger + Clone + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stats: SharedStats = Arc::new(Mutex::new(PipelineStats::default()));
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);
        let trigger_rx = Arc::new(Mutex::new(trigger_rx));

        info!(
            stores = catalog.stores().len(),
            products = catalog.products().len(),
            tick_secs = self.config.tick_interval.as_secs_f64(),
            "starting pipeline"
        );

        let simulator = {
            let ctx = Worker {
                config: self.config.clone(),
                catalog: Arc::clone(&catalog),
                ledger: ledger.clone(),
                store: Arc::clone(&store),
                shutdown: Arc::clone(&shutdown),
                stats: Arc::clone(&stats),
            };
            let trigger = trigger_tx.clone();
            let backoff = self.config.restart_backoff;
            spawn_supervised("simulator", &shutdown, backoff, move |incarnation| {
                ctx.note_incarnation(incarnation);
                simulator_loop(&ctx, incarnation, &trigger);
            })
        };

        let forecaster = {
            let ctx = Worker {
                config: self.config.clone(),
                catalog,
                ledger,
                store,
                shutdown: Arc::clone(&shutdown),
                stats: Arc::clone(&stats),
            };
            let backoff = self.config.restart_backoff;
            spawn_supervised("forecaster", &shutdown, backoff, move |incarnation| {
                ctx.note_incarnation(incarnation);
                let rx = trigger_rx.lock().unwrap_or_else(PoisonError::into_inner);
                forecaster_loop(&ctx, &rx);
            })
        };

        PipelineHandle {
            shutdown,
            trigger: trigger_tx,
            stats,
            joins: vec![simulator, forecaster],
        }
    }
}

/// Everything one worker incarnation needs.
struct Worker<L> {
    config: PipelineConfig,
    catalog: Arc<Catalog>,
    ledger: L,
    store: Arc<AlertStore>,
    shutdown: Arc<AtomicBool>,
    stats: SharedStats,
}

impl<L> Worker<L> {
    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn note_incarnation(&self, incarnation: u32) {
        if incarnation > 0 {
            record(&self.stats, |s| s.restarts += 1);
        }
    }
}

fn spawn_supervised<F>(
    name: &'static str,
    shutdown: &Arc<AtomicBool>,
    restart_backoff: Duration,
    body: F,
) -> thread::JoinHandle<()>
where
    F: Fn(u32) + Send + Sync + 'static,
{
    let shutdown = Arc::clone(shutdown);
    thread::Builder::new()
        .name(format!("{name}-supervisor"))
        .spawn(move || {
            let exit = supervise(name, &shutdown, restart_backoff, body);
            info!(worker = name, restarts = exit.restarts, "supervisor stopped");
        })
        .expect("failed to spawn pipeline supervisor thread")
}

fn simulator_loop<L: SalesLedger + Clone>(
    ctx: &Worker<L>,
    incarnation: u32,
    trigger: &mpsc::SyncSender<()>,
) {
    let mut simulator =
        Simulator::new(Arc::clone(&ctx.catalog), ctx.ledger.clone(), Arc::clone(&ctx.store))
            .with_retry_policy(ctx.config.retry_policy())
            .with_cancel_flag(Arc::clone(&ctx.shutdown));
    if let Some(seed) = ctx.config.seed {
        // A restarted worker must not replay the same draws.
        simulator = simulator.with_seed(seed.wrapping_add(u64::from(incarnation)));
    }

    info!(runner = "simulator", incarnation, "simulator started");

    let interval = ctx.config.tick_interval.max(MIN_TICK);
    let mut next_tick = Instant::now();

    while !ctx.stopping() {
        let now = Instant::now();
        if now < next_tick {
            thread::sleep((next_tick - now).min(POLL_SLICE));
            continue;
        }
        // Keep a stable cadence even if we were delayed.
        while next_tick <= now {
            next_tick += interval;
        }

        record(&ctx.stats, |s| s.ticks += 1);
        match simulator.tick() {
            Ok(alert) => {
                record(&ctx.stats, |s| s.alerts_emitted += 1);
                debug!(
                    runner = "simulator",
                    sequence = alert.sale_sequence,
                    label = %alert.label,
                    "alert emitted"
                );
                let _ = trigger.try_send(());
            }
            Err(SimulationError::Cancelled) => {
                record(&ctx.stats, |s| s.ticks_abandoned += 1);
                break;
            }
            Err(e) => {
                record(&ctx.stats, |s| s.ticks_abandoned += 1);
                warn!(runner = "simulator", error = %e, "tick abandoned");
            }
        }
    }

    info!(runner = "simulator", incarnation, "simulator stopped");
}

fn forecaster_loop<L: SalesLedger + Clone>(ctx: &Worker<L>, trigger: &mpsc::Receiver<()>) {
    let forecaster =
        Forecaster::new(Arc::clone(&ctx.catalog), ctx.ledger.clone(), Arc::clone(&ctx.store));
    let window = ctx.config.forecast_window();

    info!(
        runner = "forecaster",
        window_days = ctx.config.forecast_window_days,
        "forecaster started"
    );

    while !ctx.stopping() {
        match trigger.recv_timeout(POLL_SLICE) {
            Ok(()) => {}
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
        // Coalesce triggers that piled up during the previous retrain.
        while trigger.try_recv().is_ok() {}

        if ctx.stopping() {
            break;
        }

        match forecaster.retrain(window) {
            Ok(_) => record(&ctx.stats, |s| s.forecast_cycles += 1),
            Err(e) => {
                record(&ctx.stats, |s| s.forecast_failures += 1);
                error!(
                    runner = "forecaster",
                    error = %e,
                    "forecast retrain failed; keeping previous forecasts"
                );
            }
        }
    }

    info!(runner = "forecaster", "forecaster stopped");
}
