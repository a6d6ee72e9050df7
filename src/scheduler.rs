// src/scheduler.rs

//! Wall-clock driver for one mode.
//!
//! A `Scheduler` owns a worker thread that calls [`Market::step`] once per
//! tick interval. The market lives on that thread alone; the outside world
//! sees it only through published events and the latest snapshot. When a run
//! ends its terminal state stays visible for `restart_delay`, then a fresh
//! run of the same mode begins.

use crate::agents::agent_trait::DecisionProvider;
use crate::error::Result;
use crate::market::{Market, SimulationState, StepOutcome};
use crate::modes::{self, EngineSettings, ModeConfig};
use crate::publish::{self, ChannelListener, SimulationEvent, SimulationListener};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{error, info};

type SharedListeners = Arc<RwLock<Vec<Arc<dyn SimulationListener>>>>;
type SharedSnapshot = Arc<RwLock<Option<SimulationState>>>;

/// Keeps the latest snapshot and forwards every event to the scheduler's
/// subscribers, so subscriptions survive restarts.
struct Fanout {
    listeners: SharedListeners,
    latest: SharedSnapshot,
}

impl SimulationListener for Fanout {
    fn on_event(&self, event: &SimulationEvent) {
        if let SimulationEvent::StateUpdated(state) = event {
            *self.latest.write() = Some(state.as_ref().clone());
        }
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            publish::deliver(listener.as_ref(), event);
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct Scheduler {
    settings: EngineSettings,
    providers: Vec<(String, Arc<dyn DecisionProvider>)>,
    listeners: SharedListeners,
    latest: SharedSnapshot,
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            providers: Vec::new(),
            listeners: Arc::new(RwLock::new(Vec::new())),
            latest: Arc::new(RwLock::new(None)),
            worker: None,
        }
    }

    /// Provider used by every run started after this call.
    pub fn with_provider(mut self, tag: &str, provider: Arc<dyn DecisionProvider>) -> Self {
        self.providers.push((tag.to_string(), provider));
        self
    }

    /// Takes effect immediately, including for a run already in progress.
    /// Listeners must not call back into the scheduler.
    pub fn subscribe(&self, listener: Arc<dyn SimulationListener>) {
        self.listeners.write().push(listener);
    }

    /// Every event from now on, as a channel.
    pub fn events(&self) -> Receiver<SimulationEvent> {
        let (listener, rx) = ChannelListener::channel();
        self.subscribe(listener);
        rx
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Discards any current run and starts `mode` from its first month.
    /// An invalid mode is reported here, before any timer is armed.
    pub fn start(&mut self, mode: ModeConfig) -> Result<()> {
        self.stop();
        *self.latest.write() = None;

        let fanout = Arc::new(Fanout {
            listeners: self.listeners.clone(),
            latest: self.latest.clone(),
        });
        let run = RunLoop {
            mode,
            settings: self.settings.clone(),
            providers: self.providers.clone(),
            fanout,
        };
        let market = run.build_market(1)?;
        market.publish_snapshot();

        let (stop_tx, stop_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name(format!("arena-{}", run.mode.name))
            .spawn(move || run.drive(market, stop_rx))?;
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    pub fn start_builtin(&mut self, name: &str) -> Result<()> {
        let mode = modes::builtin(name)?;
        self.start(mode)
    }

    /// No tick starts after this returns. A tick already in progress is
    /// allowed to finish first. Calling it again is harmless.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            error!(target: "arena::engine", "scheduler thread panicked");
        }
        if let Some(state) = self.latest.write().as_mut() {
            state.is_running = false;
            info!(target: "arena::engine", mode = %state.mode, run = state.run, turn = state.turn_number, "stopped");
        }
    }

    /// True while the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.handle.is_finished())
    }

    /// A copy of the latest published state, `None` before the first start.
    pub fn get_snapshot(&self) -> Option<SimulationState> {
        self.latest.read().clone()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the worker thread needs to build and drive runs.
struct RunLoop {
    mode: ModeConfig,
    settings: EngineSettings,
    providers: Vec<(String, Arc<dyn DecisionProvider>)>,
    fanout: Arc<Fanout>,
}

impl RunLoop {
    fn build_market(&self, run: u32) -> Result<Market> {
        let mut settings = self.settings.clone();
        // a restarted run should not replay the previous one
        settings.seed = settings.seed.map(|s| s.wrapping_add(u64::from(run) - 1));

        let mut market = Market::new(self.mode.clone(), settings)?.with_run(run);
        for (tag, provider) in &self.providers {
            market.register_provider(tag, provider.clone());
        }
        market.subscribe(self.fanout.clone());
        Ok(market)
    }

    fn drive(self, mut market: Market, stop_rx: Receiver<()>) {
        let tick = self.settings.tick_interval;
        let ttl = self.settings.breaking_news_ttl;
        let mut run = 1;
        let mut next_tick = Instant::now() + tick;
        let mut breaking: Option<(u64, Instant)> = None;

        info!(target: "arena::engine", mode = %self.mode.name, tick_ms = tick.as_millis() as u64, "scheduler started");

        loop {
            let wake = match breaking {
                Some((_, expires)) => expires.min(next_tick),
                None => next_tick,
            };
            match stop_rx.recv_deadline(wake) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            if let Some((id, expires)) = breaking {
                if now >= expires {
                    market.clear_breaking_news(id);
                    breaking = None;
                }
            }
            if now < next_tick {
                continue;
            }

            match market.step() {
                StepOutcome::Advanced { .. } => {
                    if let Some(id) = market.take_raised_breaking_news() {
                        breaking = Some((id, Instant::now() + ttl));
                    }
                    next_tick = Instant::now() + tick;
                }
                StepOutcome::Ended(_) | StepOutcome::AlreadyEnded => {
                    match stop_rx.recv_timeout(self.settings.restart_delay) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    run += 1;
                    market = match self.build_market(run) {
                        Ok(m) => m,
                        Err(err) => {
                            error!(target: "arena::engine", mode = %self.mode.name, error = %err, "restart failed");
                            break;
                        }
                    };
                    info!(target: "arena::engine", mode = %self.mode.name, run, "restarting");
                    market.publish_snapshot();
                    breaking = None;
                    next_tick = Instant::now() + tick;
                }
            }
        }
    }
}
