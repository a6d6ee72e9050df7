// src/agents/remote.rs

//! Chat-completion backed decision provider.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol, so any
//! compatible endpoint (hosted or local) can drive an agent.

use super::agent_trait::{AgentIdentity, Decision, DecisionProvider, MarketContext};
use super::config::{DEFAULT_API_BASE, DEFAULT_MODEL, PROVIDER_MAX_TOKENS, PROVIDER_TEMPERATURE};
use crate::error::ProviderError;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = r#"You are a trader competing in a simulated stock market.
Each month you see the market and your portfolio and make exactly one move.

Respond ONLY with JSON in this exact format:
{
  "thinking": "your private analysis, two or three sentences",
  "action": "HOLD" | "BUY <TICKER> <SHARES>" | "SELL <TICKER> <SHARES>",
  "reasoning": "one sentence explaining the move"
}
SHARES must be a positive whole number. You cannot spend more cash than you have
and cannot sell shares you do not own."#;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Provider settings, usually read from the environment.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl RemoteSettings {
    /// `ARENA_API_KEY`, `ARENA_API_BASE`, `ARENA_MODEL`.
    pub fn from_env(timeout: Duration) -> Self {
        Self {
            api_key: std::env::var("ARENA_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("ARENA_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
            model: std::env::var("ARENA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout,
        }
    }
}

pub struct RemoteProvider {
    name: String,
    settings: RemoteSettings,
    client: Client,
}

impl RemoteProvider {
    pub fn new(name: &str, settings: RemoteSettings) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            name: name.to_string(),
            settings,
            client,
        })
    }

    fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;

        let request = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: PROVIDER_TEMPERATURE,
            max_tokens: PROVIDER_MAX_TOKENS,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status { code, body });
        }

        let response: ChatCompletionResponse = response.json()?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("no choices in response".to_string()))
    }
}

impl DecisionProvider for RemoteProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&self, agent: &AgentIdentity, context: &MarketContext) -> Result<Decision, ProviderError> {
        let content = self.chat(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(agent, context)),
        ])?;
        debug!(target: "arena::provider", provider = %self.name, agent = %agent.name, "raw reply: {}", content);
        parse_decision(&content)
    }
}

/// Renders the market context as the user message.
pub fn build_prompt(agent: &AgentIdentity, ctx: &MarketContext) -> String {
    let mut p = String::new();
    let _ = writeln!(p, "You are {}. Personality: {}", agent.name, agent.personality);
    let _ = writeln!(p, "\n## Date: {}", ctx.date);
    let _ = writeln!(
        p,
        "{}: {:.2} ({:+.2}% this month)",
        ctx.index_name, ctx.index_level, ctx.index_change_percent
    );
    if let Some(event) = &ctx.active_event {
        let _ = writeln!(p, "Ongoing event: {}", event);
    }

    let _ = writeln!(p, "\n## Your portfolio");
    let _ = writeln!(p, "Cash: ${:.2}  Net worth: ${:.2}", ctx.cash, ctx.net_worth);
    if ctx.holdings.is_empty() {
        let _ = writeln!(p, "No open positions.");
    }
    for h in &ctx.holdings {
        let _ = writeln!(
            p,
            "- {}: {} shares, avg ${:.2}, now ${:.2} ({:+.1}%)",
            h.ticker,
            h.shares,
            h.avg_cost,
            h.price,
            h.profit_percent()
        );
    }

    let _ = writeln!(p, "\n## Top gainers");
    for m in &ctx.top_gainers {
        let _ = writeln!(p, "- {} ({}): ${:.2} {:+.2}%", m.ticker, m.sector, m.price, m.change_percent);
    }
    let _ = writeln!(p, "\n## Top losers");
    for m in &ctx.top_losers {
        let _ = writeln!(p, "- {} ({}): ${:.2} {:+.2}%", m.ticker, m.sector, m.price, m.change_percent);
    }

    if !ctx.headlines.is_empty() {
        let _ = writeln!(p, "\n## Headlines");
        for h in &ctx.headlines {
            let _ = writeln!(p, "- {}", h);
        }
    }

    p.push_str("\nMake your move as JSON.");
    p
}

/// Extracts the JSON object from a reply, tolerating code fences and chatter
/// around it.
pub fn parse_decision(content: &str) -> Result<Decision, ProviderError> {
    let start = content
        .find('{')
        .ok_or_else(|| ProviderError::Malformed("no JSON object in reply".to_string()))?;
    let end = content
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| ProviderError::Malformed("unterminated JSON object".to_string()))?;
    let decision: Decision = serde_json::from_str(&content[start..=end])?;
    if decision.action.trim().is_empty() {
        return Err(ProviderError::Malformed("empty action".to_string()));
    }
    Ok(decision)
}
