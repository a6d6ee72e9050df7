// src/agents/mod.rs

pub mod agent_trait;
pub mod config;
pub mod fallback;
pub mod personality;
pub mod remote;
pub mod trader;
