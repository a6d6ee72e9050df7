// tests/simulation_only.rs
//
// The simulation-only switch is process-wide, so it gets a test binary of its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trading_arena::{
    AgentIdentity, Decision, DecisionProvider, EngineSettings, Market, MarketContext, ProviderError,
    modes, set_simulation_only, simulation_only,
};

struct CountingProvider {
    calls: AtomicUsize,
}

impl DecisionProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn decide(&self, _: &AgentIdentity, _: &MarketContext) -> Result<Decision, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Decision::hold("remote thoughts", "remote says hold"))
    }
}

fn market_with(provider: Arc<CountingProvider>) -> Market {
    let mode = modes::builtin("stocks").unwrap();
    let tags: Vec<String> = mode.agents.iter().map(|a| a.provider.clone()).collect();
    let mut market = Market::new(mode, EngineSettings { seed: Some(5), ..EngineSettings::default() }).unwrap();
    for tag in tags {
        market.register_provider(&tag, provider.clone());
    }
    market
}

#[test]
fn toggle_bypasses_and_restores_remote_providers() {
    let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
    let mut market = market_with(provider.clone());
    let agents = market.state().agents.len();

    set_simulation_only(true);
    assert!(simulation_only());
    market.step();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(market.state().agents.iter().all(|a| a.thinking_text != "remote thoughts"));

    set_simulation_only(false);
    market.step();
    assert_eq!(provider.calls.load(Ordering::SeqCst), agents);
    assert!(market.state().agents.iter().all(|a| a.thinking_text == "remote thoughts"));
    assert!(market.state().agents.iter().all(|a| a.last_action_text == "HOLD"));
}
