// src/publish.rs

//! Observer side of the engine: a closed set of events and the listeners
//! that receive them.
//!
//! Listeners are append-only and only ever see copies; nothing they do can
//! reach back into engine state.

use crate::market::{RunSummary, SimulationState};
use crate::news::NewsItem;
use crate::types::TradeReport;
use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SimulationEvent {
    StateUpdated(Box<SimulationState>),
    NewsPublished(NewsItem),
    BreakingNewsRaised(NewsItem),
    TradeExecuted(TradeReport),
    RunEnded(RunSummary),
}

impl SimulationEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationEvent::StateUpdated(_) => "state_updated",
            SimulationEvent::NewsPublished(_) => "news_published",
            SimulationEvent::BreakingNewsRaised(_) => "breaking_news_raised",
            SimulationEvent::TradeExecuted(_) => "trade_executed",
            SimulationEvent::RunEnded(_) => "run_ended",
        }
    }
}

/// Receives every event an engine publishes. Called on the engine's thread,
/// so implementations should return quickly.
pub trait SimulationListener: Send + Sync {
    fn on_event(&self, event: &SimulationEvent);
}

#[derive(Default, Clone)]
pub struct Publisher {
    listeners: Vec<Arc<dyn SimulationListener>>,
}

impl Publisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn SimulationListener>) {
        self.listeners.push(listener);
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    pub fn publish(&self, event: SimulationEvent) {
        for listener in &self.listeners {
            deliver(listener.as_ref(), &event);
        }
    }

    /// Builds the event only when somebody is listening.
    pub fn publish_with(&self, make: impl FnOnce() -> SimulationEvent) {
        if self.has_listeners() {
            self.publish(make());
        }
    }
}

/// Hands `event` to one listener. A panicking listener is logged and skipped;
/// the engine and the remaining listeners carry on.
pub(crate) fn deliver(listener: &dyn SimulationListener, event: &SimulationEvent) {
    if catch_unwind(AssertUnwindSafe(|| listener.on_event(event))).is_err() {
        error!(target: "arena::engine", event = event.kind(), "listener panicked");
    }
}

/// Forwards events into a crossbeam channel.
pub struct ChannelListener {
    tx: Sender<SimulationEvent>,
}

impl ChannelListener {
    pub fn new(tx: Sender<SimulationEvent>) -> Self {
        Self { tx }
    }

    /// A listener plus the receiving end of its channel.
    pub fn channel() -> (Arc<Self>, Receiver<SimulationEvent>) {
        let (tx, rx) = unbounded();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl SimulationListener for ChannelListener {
    fn on_event(&self, event: &SimulationEvent) {
        // receiver gone: nobody cares anymore
        let _ = self.tx.send(event.clone());
    }
}
