// src/events.rs

//! Scheduled historical events and the tracker that windows them.
//!
//! An event becomes active on the turn its date is reached and stays active
//! for exactly `duration` turns. Only one event is active at a time; a newly
//! dated event supersedes whatever is running.

use crate::types::TurnDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where an event's effect lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectScope {
    Market,
    Sector(String),
}

/// A total percent move spread evenly across the event's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    pub scope: EffectScope,
    /// Total move in percent (e.g. -30.0 for a 30 % crash).
    pub magnitude: f64,
}

impl EventEffect {
    pub fn market(magnitude: f64) -> Self {
        Self {
            scope: EffectScope::Market,
            magnitude,
        }
    }

    pub fn sector(sector: &str, magnitude: f64) -> Self {
        Self {
            scope: EffectScope::Sector(sector.to_string()),
            magnitude,
        }
    }

    fn matches_sector(&self, sector: &str) -> bool {
        match &self.scope {
            EffectScope::Sector(s) => s.eq_ignore_ascii_case(sector),
            EffectScope::Market => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date: TurnDate,
    /// Lifetime in turns.
    pub duration: u32,
    pub effects: Vec<EventEffect>,
}

impl HistoricalEvent {
    fn per_turn(&self, magnitude: f64) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        magnitude / self.duration as f64
    }

    /// Per-turn percent added to the shared market trend.
    pub fn market_term(&self) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.scope == EffectScope::Market)
            .map(|e| self.per_turn(e.magnitude))
            .sum()
    }

    /// Per-turn percent added to instruments of `sector`.
    pub fn sector_term(&self, sector: &str) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.matches_sector(sector))
            .map(|e| self.per_turn(e.magnitude))
            .sum()
    }
}

/// The running event plus the turn it started on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveEvent {
    pub event: HistoricalEvent,
    pub activated_turn: u32,
}

impl ActiveEvent {
    pub fn turns_since_activation(&self, turn: u32) -> u32 {
        turn.saturating_sub(self.activated_turn)
    }
}

/// What changed during one call to [`EventTracker::advance`].
#[derive(Debug, Default)]
pub struct EventTransition {
    pub deactivated: Option<HistoricalEvent>,
    pub activated: Option<HistoricalEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct EventTracker {
    catalog: Vec<HistoricalEvent>,
    active: Option<ActiveEvent>,
}

impl EventTracker {
    pub fn new(catalog: Vec<HistoricalEvent>) -> Self {
        Self {
            catalog,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveEvent> {
        self.active.as_ref()
    }

    pub fn active_event(&self) -> Option<&HistoricalEvent> {
        self.active.as_ref().map(|a| &a.event)
    }

    /// Expires the running event once its lifetime is spent, then activates
    /// any event dated `date`.
    pub fn advance(&mut self, date: TurnDate, turn: u32) -> EventTransition {
        let mut transition = EventTransition::default();

        let expired = self
            .active
            .as_ref()
            .is_some_and(|a| a.turns_since_activation(turn) >= a.event.duration);
        if expired {
            if let Some(done) = self.active.take() {
                info!(target: "arena::news", event = %done.event.name, turn, "historical event ended");
                transition.deactivated = Some(done.event);
            }
        }

        if let Some(next) = self.catalog.iter().find(|e| e.date == date) {
            let superseding = self
                .active
                .as_ref()
                .is_some_and(|a| a.event.id != next.id);
            if superseding {
                if let Some(prev) = self.active.take() {
                    transition.deactivated = Some(prev.event);
                }
            }
            if self.active.is_none() && next.duration > 0 {
                info!(target: "arena::news", event = %next.name, %date, turn, "historical event started");
                self.active = Some(ActiveEvent {
                    event: next.clone(),
                    activated_turn: turn,
                });
                transition.activated = Some(next.clone());
            }
        }

        transition
    }
}
