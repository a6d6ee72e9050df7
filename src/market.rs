// src/market.rs

//! One simulation: its full state plus the tick body.
//!
//! `Market` is synchronous and single-owner. [`Market::step`] advances the
//! calendar by one month, evolves every price, runs the news desk and the
//! event tracker, lets every agent decide and settle in roster order, marks
//! every book to market and publishes a snapshot. Wall-clock pacing and
//! restarts belong to [`crate::scheduler::Scheduler`].

use crate::agents::agent_trait::{AgentIdentity, ContextInputs, Decision, DecisionProvider, MarketContext};
use crate::agents::personality::Personality;
use crate::agents::trader::Trader;
use crate::agents::{config, fallback};
use crate::error::{ProviderError, Result};
use crate::events::{ActiveEvent, EventTracker, EventTransition};
use crate::modes::{EngineSettings, ModeConfig};
use crate::news::{self, NewsDesk, NewsItem};
use crate::publish::{Publisher, SimulationEvent, SimulationListener};
use crate::settlement::{self, Settlement};
use crate::simulators::{MarketModel, TrendFollowingModel};
use crate::stocks::InstrumentBook;
use crate::types::TurnDate;
use crossbeam_channel::{RecvTimeoutError, bounded};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Everything a viewer needs to draw one moment of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationState {
    pub mode: String,
    /// 1 for the first run of a scheduler, incremented on every restart.
    pub run: u32,
    pub current_date: TurnDate,
    pub start_date: TurnDate,
    pub end_date: TurnDate,
    pub turn_number: u32,
    pub total_turns: u32,
    pub index_name: String,
    pub market_index: f64,
    pub market_change_percent: f64,
    pub instruments: InstrumentBook,
    pub agents: Vec<Trader>,
    /// Newest first.
    pub news: Vec<NewsItem>,
    pub breaking_news: Option<NewsItem>,
    pub active_event: Option<ActiveEvent>,
    pub winner: Option<Standing>,
    pub is_running: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    /// 1-based.
    pub rank: usize,
    pub agent_id: u64,
    pub name: String,
    pub color: String,
    pub net_worth: f64,
    pub return_pct: f64,
    pub total_trades: u64,
    pub realized_pnl: f64,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub run: u32,
    pub final_date: TurnDate,
    pub turns_played: u32,
    pub winner: Standing,
    /// Best first; ties keep roster order.
    pub standings: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The tick for `date` was processed.
    Advanced { date: TurnDate, turn: u32 },
    /// The calendar ran past the end date; the run is over.
    Ended(RunSummary),
    /// `step` was called on a run that already ended.
    AlreadyEnded,
}

/// Ranks traders by net worth. The sort is stable, so ties keep roster order
/// and the first entry is the winner.
pub fn standings(agents: &[Trader]) -> Vec<Standing> {
    let mut sorted: Vec<&Trader> = agents.iter().collect();
    sorted.sort_by(|a, b| b.net_worth.partial_cmp(&a.net_worth).unwrap_or(Ordering::Equal));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, t)| Standing {
            rank: i + 1,
            agent_id: t.id,
            name: t.name.clone(),
            color: t.color.clone(),
            net_worth: t.net_worth,
            return_pct: t.return_pct(),
            total_trades: t.total_trades,
            realized_pnl: t.realized_pnl,
        })
        .collect()
}

pub struct Market {
    mode: ModeConfig,
    settings: EngineSettings,
    state: SimulationState,
    model: Box<dyn MarketModel>,
    events: EventTracker,
    news_desk: NewsDesk,
    providers: HashMap<String, Arc<dyn DecisionProvider>>,
    publisher: Publisher,
    rng: StdRng,
    raised_breaking: Option<u64>,
}

impl Market {
    /// Builds a fresh run. Fails only on an invalid mode.
    pub fn new(mode: ModeConfig, settings: EngineSettings) -> Result<Self> {
        mode.validate()?;

        let agents = mode
            .agents
            .iter()
            .enumerate()
            .map(|(i, spec)| Trader::new(i as u64 + 1, spec, mode.starting_cash))
            .collect();
        let state = SimulationState {
            mode: mode.name.clone(),
            run: 1,
            current_date: mode.start,
            start_date: mode.start,
            end_date: mode.end,
            turn_number: 0,
            total_turns: mode.total_turns(),
            index_name: mode.index_name.clone(),
            market_index: mode.index_base,
            market_change_percent: 0.0,
            instruments: InstrumentBook::from_specs(&mode.instruments),
            agents,
            news: Vec::new(),
            breaking_news: None,
            active_event: None,
            winner: None,
            is_running: true,
        };
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            target: "arena::engine",
            mode = %mode.name,
            start = %mode.start,
            end = %mode.end,
            instruments = mode.instruments.len(),
            agents = mode.agents.len(),
            "new run"
        );

        Ok(Self {
            events: EventTracker::new(mode.events.clone()),
            mode,
            settings,
            state,
            model: Box::new(TrendFollowingModel::default()),
            news_desk: NewsDesk::new(),
            providers: HashMap::new(),
            publisher: Publisher::new(),
            rng,
            raised_breaking: None,
        })
    }

    pub fn with_run(mut self, run: u32) -> Self {
        self.state.run = run;
        self
    }

    pub fn with_model(mut self, model: Box<dyn MarketModel>) -> Self {
        self.model = model;
        self
    }

    /// Routes agents whose provider tag is `tag` to `provider`.
    pub fn with_provider(mut self, tag: &str, provider: Arc<dyn DecisionProvider>) -> Self {
        self.register_provider(tag, provider);
        self
    }

    pub fn register_provider(&mut self, tag: &str, provider: Arc<dyn DecisionProvider>) {
        self.providers.insert(tag.to_string(), provider);
    }

    pub fn subscribe(&mut self, listener: Arc<dyn SimulationListener>) {
        self.publisher.subscribe(listener);
    }

    pub fn mode(&self) -> &ModeConfig {
        &self.mode
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SimulationState {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn publish_snapshot(&self) {
        self.publisher
            .publish_with(|| SimulationEvent::StateUpdated(Box::new(self.state.clone())));
    }

    /// Id of the breaking headline raised by the last tick, if any.
    pub fn take_raised_breaking_news(&mut self) -> Option<u64> {
        self.raised_breaking.take()
    }

    /// Clears the breaking headline if it is still `id`. A newer headline
    /// stays up.
    pub fn clear_breaking_news(&mut self, id: u64) -> bool {
        match &self.state.breaking_news {
            Some(item) if item.id == id => {
                self.state.breaking_news = None;
                debug!(target: "arena::news", id, "breaking news expired");
                self.publish_snapshot();
                true
            }
            _ => false,
        }
    }

    /// Processes one month.
    pub fn step(&mut self) -> StepOutcome {
        if !self.state.is_running {
            return StepOutcome::AlreadyEnded;
        }

        let date = self.state.current_date.next();
        if date > self.mode.end {
            return StepOutcome::Ended(self.finish());
        }
        self.state.current_date = date;
        self.state.turn_number += 1;
        let turn = self.state.turn_number;

        // expiry and activation settle before prices move
        let transition = self.events.advance(date, turn);
        self.state.active_event = self.events.active().cloned();

        self.evolve_prices(date);
        self.run_news(date, transition);
        self.run_agents(date);
        self.mark_to_market();

        debug!(
            target: "arena::engine",
            mode = %self.mode.name,
            %date,
            turn,
            index = self.state.market_index,
            "tick processed"
        );
        self.publish_snapshot();
        StepOutcome::Advanced { date, turn }
    }

    fn evolve_prices(&mut self, date: TurnDate) {
        let active = self.events.active_event();
        let trend = self.model.market_trend(active, &mut self.rng);

        for inst in self.state.instruments.iter_mut() {
            let mv = self.model.evolve(inst, trend, active, date, &mut self.rng);
            inst.apply_price(mv.price, mv.candle);
        }

        let old = self.state.market_index;
        let new = self.model.evolve_index(old, trend);
        self.state.market_index = new;
        self.state.market_change_percent = (new - old) / old * 100.0;
    }

    fn run_news(&mut self, date: TurnDate, transition: EventTransition) {
        if let Some(item) = self.news_desk.roll(date, &self.state.instruments, &mut self.rng) {
            self.publish_news(item);
        }
        if let Some(event) = transition.activated {
            let item = self.news_desk.event_headline(date, &event);
            self.publish_news(item);
        }
    }

    fn publish_news(&mut self, item: NewsItem) {
        news::push_recent(&mut self.state.news, item.clone());
        if item.critical {
            info!(target: "arena::news", id = item.id, "breaking: {}", item.headline);
            self.state.breaking_news = Some(item.clone());
            self.raised_breaking = Some(item.id);
            self.publisher.publish(SimulationEvent::NewsPublished(item.clone()));
            self.publisher.publish(SimulationEvent::BreakingNewsRaised(item));
        } else {
            self.publisher.publish(SimulationEvent::NewsPublished(item));
        }
    }

    fn run_agents(&mut self, date: TurnDate) {
        for idx in 0..self.state.agents.len() {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.process_agent(idx, date)));
            if outcome.is_err() {
                let agent = &mut self.state.agents[idx];
                error!(target: "arena::engine", agent = %agent.name, %date, "agent turn panicked");
                agent.is_active = false;
                agent.thinking_text = "Error processing decision".to_string();
                agent.last_action_text = "HOLD".to_string();
            }
        }
    }

    fn process_agent(&mut self, idx: usize, date: TurnDate) {
        let context = {
            let inputs = ContextInputs {
                date,
                index_name: &self.state.index_name,
                index_level: self.state.market_index,
                index_change_percent: self.state.market_change_percent,
                instruments: &self.state.instruments,
                news: &self.state.news,
                active_event: self.events.active_event().map(|e| e.name.as_str()),
            };
            MarketContext::build(&self.state.agents[idx], &inputs)
        };

        let decision = self.decide(idx, &context);

        let trader = &mut self.state.agents[idx];
        trader.is_active = false;
        trader.thinking_text = decision.thinking_text;
        let outcome = settlement::apply(trader, &decision.action, &mut self.state.instruments, date);
        trader.last_action_text = outcome.describe();

        if let Settlement::Filled(report) = outcome {
            info!(
                target: "arena::engine",
                agent = %report.agent_name,
                side = %report.side,
                ticker = %report.ticker,
                shares = report.shares,
                price = report.price,
                "trade executed"
            );
            self.publisher.publish(SimulationEvent::TradeExecuted(report));
        }
    }

    /// Asks the agent's provider, falling back to the local policy when there
    /// is none, the process runs simulation-only, or the call fails.
    fn decide(&mut self, idx: usize, context: &MarketContext) -> Decision {
        let trader = &self.state.agents[idx];
        let personality = Personality::classify(&trader.personality);

        let provider = if config::simulation_only() {
            None
        } else {
            self.providers.get(&trader.provider).cloned()
        };

        if let Some(provider) = provider {
            let identity = AgentIdentity {
                name: trader.name.clone(),
                personality: trader.personality.clone(),
            };
            self.state.agents[idx].is_active = true;
            self.publish_snapshot();

            match call_with_timeout(provider.clone(), identity, context.clone(), self.settings.provider_timeout) {
                Ok(decision) => return decision,
                Err(err) => warn!(
                    target: "arena::provider",
                    agent = %self.state.agents[idx].name,
                    provider = provider.name(),
                    error = %err,
                    "decision failed, using fallback"
                ),
            }
        }

        fallback::decide(&personality, context, &mut self.rng)
    }

    fn mark_to_market(&mut self) {
        for agent in self.state.agents.iter_mut() {
            agent.recompute_net_worth(&self.state.instruments);
        }
    }

    fn finish(&mut self) -> RunSummary {
        self.state.is_running = false;
        self.state.breaking_news = None;

        let standings = standings(&self.state.agents);
        // validated modes always have agents
        let winner = standings[0].clone();
        self.state.winner = Some(winner.clone());

        let summary = RunSummary {
            mode: self.mode.name.clone(),
            run: self.state.run,
            final_date: self.state.current_date,
            turns_played: self.state.turn_number,
            winner,
            standings,
        };
        info!(
            target: "arena::engine",
            mode = %summary.mode,
            run = summary.run,
            winner = %summary.winner.name,
            net_worth = summary.winner.net_worth,
            "run ended"
        );

        self.publish_snapshot();
        self.publisher.publish(SimulationEvent::RunEnded(summary.clone()));
        summary
    }
}

/// Runs one provider call on its own thread and waits at most `timeout`.
/// A timed-out call is abandoned; its thread finishes in the background.
fn call_with_timeout(
    provider: Arc<dyn DecisionProvider>,
    agent: AgentIdentity,
    context: MarketContext,
    timeout: Duration,
) -> std::result::Result<Decision, ProviderError> {
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name(format!("provider-{}", provider.name()))
        .spawn(move || {
            let _ = tx.send(provider.decide(&agent, &context));
        })
        .map_err(|_| ProviderError::Disconnected)?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(ProviderError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(ProviderError::Disconnected),
    }
}
