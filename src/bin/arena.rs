// src/bin/arena.rs

//! Headless arena runner.
//!
//! Without `--turns` one scheduler per mode runs on the wall clock forever,
//! restarting after each run and printing the final standings. With
//! `--turns N` each mode is stepped N months as fast as possible and the
//! standings are printed once.

use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trading_arena::{
    ChannelListener, DecisionProvider, EngineSettings, LogConfig, LogFormat, Market, ModeConfig,
    RemoteProvider, RemoteSettings, RunSummary, Scheduler, SimulationEvent, Standing, StepOutcome,
    init_logging, modes, set_simulation_only,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(about = "Closed-market trading arena for autonomous agents")]
#[command(version)]
struct Args {
    /// Built-in mode to run; repeat for several
    #[arg(long = "mode", env = "ARENA_MODES", value_delimiter = ',')]
    modes: Vec<String>,

    /// Extra mode loaded from a JSON file
    #[arg(long, env = "ARENA_CONFIG")]
    config: Option<PathBuf>,

    /// Wall-clock milliseconds per simulated month
    #[arg(long, env = "ARENA_TICK_MS", default_value_t = 2_000)]
    tick_ms: u64,

    /// Pause between the end of a run and the next one
    #[arg(long, env = "ARENA_RESTART_MS", default_value_t = 10_000)]
    restart_ms: u64,

    /// Breaking news lifetime
    #[arg(long, env = "ARENA_BREAKING_MS", default_value_t = 8_000)]
    breaking_ms: u64,

    /// Decision provider timeout
    #[arg(long, env = "ARENA_PROVIDER_TIMEOUT_MS", default_value_t = 30_000)]
    provider_timeout_ms: u64,

    #[arg(long, env = "ARENA_SEED")]
    seed: Option<u64>,

    /// Step this many months per mode without waiting, then exit
    #[arg(long, env = "ARENA_TURNS")]
    turns: Option<u32>,

    /// Never call remote providers
    #[arg(long, env = "ARENA_SIMULATION_ONLY")]
    simulation_only: bool,

    #[arg(long, env = "ARENA_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    #[arg(long, env = "ARENA_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    init_logging(&LogConfig {
        format: args.log_format,
        level: args.log_level.clone(),
    });

    if let Err(err) = run(args) {
        error!(target: "arena::engine", error = %err, "arena failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> trading_arena::Result<()> {
    if args.simulation_only {
        set_simulation_only(true);
    }

    let settings = EngineSettings {
        tick_interval: Duration::from_millis(args.tick_ms),
        restart_delay: Duration::from_millis(args.restart_ms),
        breaking_news_ttl: Duration::from_millis(args.breaking_ms),
        provider_timeout: Duration::from_millis(args.provider_timeout_ms),
        seed: args.seed,
    };

    let mut selected = Vec::new();
    let names = if args.modes.is_empty() && args.config.is_none() {
        vec!["stocks".to_string()]
    } else {
        args.modes.clone()
    };
    for name in &names {
        selected.push(modes::builtin(name)?);
    }
    if let Some(path) = &args.config {
        selected.push(ModeConfig::from_json_file(path)?);
    }

    let providers = remote_providers(&selected, &settings);

    match args.turns {
        Some(turns) => {
            for mode in selected {
                run_headless(mode, &settings, &providers, turns)?;
            }
            Ok(())
        }
        None => run_forever(selected, settings, providers),
    }
}

/// One remote provider per distinct agent tag, when an API key is present.
fn remote_providers(selected: &[ModeConfig], settings: &EngineSettings) -> Vec<(String, Arc<dyn DecisionProvider>)> {
    let remote = RemoteSettings::from_env(settings.provider_timeout);
    if remote.api_key.is_none() {
        warn!(target: "arena::provider", "ARENA_API_KEY not set; every agent trades on the local policy");
        return Vec::new();
    }

    let tags: BTreeSet<&str> = selected
        .iter()
        .flat_map(|m| m.agents.iter().map(|a| a.provider.as_str()))
        .collect();
    let mut providers: Vec<(String, Arc<dyn DecisionProvider>)> = Vec::new();
    for tag in tags {
        match RemoteProvider::new(tag, remote.clone()) {
            Ok(provider) => providers.push((tag.to_string(), Arc::new(provider))),
            Err(err) => warn!(target: "arena::provider", tag, error = %err, "could not build provider"),
        }
    }
    providers
}

fn run_headless(
    mode: ModeConfig,
    settings: &EngineSettings,
    providers: &[(String, Arc<dyn DecisionProvider>)],
    turns: u32,
) -> trading_arena::Result<()> {
    let mut market = Market::new(mode, settings.clone())?;
    for (tag, provider) in providers {
        market.register_provider(tag, provider.clone());
    }

    for _ in 0..turns {
        if let StepOutcome::Ended(summary) = market.step() {
            print_summary(&summary);
            return Ok(());
        }
    }

    let state = market.state();
    info!(target: "arena::engine", mode = %state.mode, date = %state.current_date, "turn limit reached");
    println!("\n{} after {} turns ({}):", state.mode, state.turn_number, state.current_date);
    print_standings(&trading_arena::market::standings(&state.agents));
    Ok(())
}

fn run_forever(
    selected: Vec<ModeConfig>,
    settings: EngineSettings,
    providers: Vec<(String, Arc<dyn DecisionProvider>)>,
) -> trading_arena::Result<()> {
    let (listener, rx) = ChannelListener::channel();
    let mut schedulers = Vec::new();
    for mode in selected {
        let mut scheduler = providers
            .iter()
            .fold(Scheduler::new(settings.clone()), |s, (tag, p)| s.with_provider(tag, p.clone()));
        scheduler.subscribe(listener.clone());
        scheduler.start(mode)?;
        schedulers.push(scheduler);
    }

    for event in rx.iter() {
        match event {
            SimulationEvent::RunEnded(summary) => print_summary(&summary),
            SimulationEvent::BreakingNewsRaised(item) => println!("[{}] {}", item.date, item.headline),
            _ => {}
        }
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\n{} run {} ended {} after {} turns. Winner: {}",
        summary.mode, summary.run, summary.final_date, summary.turns_played, summary.winner.name
    );
    print_standings(&summary.standings);
}

fn print_standings(standings: &[Standing]) {
    println!("{:>4}  {:<12} {:>16} {:>9} {:>7}", "rank", "agent", "net worth", "return", "trades");
    for s in standings {
        println!(
            "{:>4}  {:<12} {:>16.2} {:>8.2}% {:>7}",
            s.rank, s.name, s.net_worth, s.return_pct, s.total_trades
        );
    }
}
