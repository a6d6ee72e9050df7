// src/lib.rs

// === 1. Declare all the top-level modules ===
pub mod agents;
pub mod error;
pub mod events;
pub mod logging;
pub mod market;
pub mod modes;
pub mod news;
pub mod publish;
pub mod scheduler;
pub mod settlement;
pub mod simulators;
pub mod stocks;
pub mod types;

// === 2. Re-export the public-facing components to create a clean API ===

// --- From `agents` ---
pub use agents::agent_trait::{AgentIdentity, Decision, DecisionProvider, MarketContext};
pub use agents::config::{set_simulation_only, simulation_only};
pub use agents::personality::Personality;
pub use agents::remote::{RemoteProvider, RemoteSettings};
pub use agents::trader::{AgentSpec, Holding, Trader};

// --- From the engine ---
pub use market::{Market, RunSummary, SimulationState, Standing, StepOutcome};
pub use scheduler::Scheduler;
pub use settlement::{Rejection, Settlement};

// --- Configuration, events and news ---
pub use events::{EffectScope, EventEffect, EventTracker, HistoricalEvent};
pub use modes::{EngineSettings, ModeConfig};
pub use news::{NewsCategory, NewsItem};
pub use publish::{ChannelListener, Publisher, SimulationEvent, SimulationListener};

// --- From `simulators` ---
pub use simulators::{MarketModel, PRICE_FLOOR, PriceMove, TrendFollowingModel};

// --- From `stocks` and `types` ---
pub use stocks::{Candle, Instrument, InstrumentBook, InstrumentSpec};
pub use types::{Side, TradeAction, TradeMarker, TradeReport, TurnDate};

// --- Errors and logging ---
pub use error::{ArenaError, ConfigError, ProviderError, Result};
pub use logging::{LogConfig, LogFormat, init_logging};
