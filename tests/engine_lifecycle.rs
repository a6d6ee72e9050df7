// tests/engine_lifecycle.rs

use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};
use trading_arena::{
    AgentSpec, EngineSettings, EventEffect, HistoricalEvent, InstrumentSpec, ModeConfig, Scheduler,
    SimulationEvent, TurnDate,
};

fn settings(tick_ms: u64, restart_ms: u64) -> EngineSettings {
    EngineSettings {
        tick_interval: Duration::from_millis(tick_ms),
        restart_delay: Duration::from_millis(restart_ms),
        breaking_news_ttl: Duration::from_millis(50),
        provider_timeout: Duration::from_millis(100),
        seed: Some(11),
    }
}

fn quarter_mode() -> ModeConfig {
    ModeConfig {
        name: "quarter".into(),
        start: TurnDate::new(2020, 1),
        end: TurnDate::new(2020, 3),
        index_name: "Q".into(),
        index_base: 1000.0,
        starting_cash: 25_000.0,
        instruments: vec![
            InstrumentSpec::new("AAA", "Alpha", "Technology", 12.0, 3.0),
            InstrumentSpec::new("BBB", "Beta", "Energy", 8.0, 2.0),
        ],
        agents: vec![
            AgentSpec::new("Ada", "local", "aggressive momentum", "#f00"),
            AgentSpec::new("Bo", "local", "cautious value", "#0f0"),
        ],
        events: vec![],
    }
}

/// Waits for the first event matching `pred`.
fn wait_for(rx: &Receiver<SimulationEvent>, timeout: Duration, pred: impl Fn(&SimulationEvent) -> bool) -> Option<SimulationEvent> {
    let deadline = Instant::now() + timeout;
    while let Ok(event) = rx.recv_deadline(deadline) {
        if pred(&event) {
            return Some(event);
        }
    }
    None
}

#[test]
fn run_ends_stays_observable_then_restarts() {
    let mut scheduler = Scheduler::new(settings(10, 400));
    let rx = scheduler.events();
    scheduler.start(quarter_mode()).unwrap();

    let ended = wait_for(&rx, Duration::from_secs(5), |e| matches!(e, SimulationEvent::RunEnded(_)));
    let summary = match ended {
        Some(SimulationEvent::RunEnded(summary)) => summary,
        other => panic!("run never ended: {:?}", other.map(|e| e.kind())),
    };
    assert_eq!(summary.turns_played, 2);
    assert_eq!(summary.run, 1);

    // terminal state is visible during the restart delay
    let snap = scheduler.get_snapshot().unwrap();
    assert!(!snap.is_running);
    assert_eq!(snap.current_date, TurnDate::new(2020, 3));
    let winner = snap.winner.unwrap();
    let best = snap.agents.iter().map(|a| a.net_worth).fold(f64::MIN, f64::max);
    assert_eq!(winner.net_worth, best);

    let restarted = wait_for(&rx, Duration::from_secs(5), |e| {
        matches!(e, SimulationEvent::StateUpdated(s) if s.run == 2)
    });
    match restarted {
        Some(SimulationEvent::StateUpdated(state)) => {
            assert_eq!(state.turn_number, 0);
            assert!(state.is_running);
            assert!(state.agents.iter().all(|a| a.cash == 25_000.0 && a.holdings.is_empty()));
        }
        other => panic!("no restart: {:?}", other.map(|e| e.kind())),
    }

    scheduler.stop();
}

#[test]
fn stop_is_idempotent_and_silences_the_engine() {
    let mut scheduler = Scheduler::new(settings(5, 5));
    scheduler.stop();

    let rx = scheduler.events();
    scheduler.start(quarter_mode()).unwrap();
    assert!(wait_for(&rx, Duration::from_secs(5), |e| {
        matches!(e, SimulationEvent::StateUpdated(s) if s.turn_number >= 1)
    })
    .is_some());

    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
    assert!(!scheduler.get_snapshot().unwrap().is_running);

    while rx.try_recv().is_ok() {}
    std::thread::sleep(Duration::from_millis(100));
    assert!(rx.try_recv().is_err(), "events after stop");
}

#[test]
fn invalid_mode_fails_before_the_timer_starts() {
    let mut scheduler = Scheduler::new(settings(5, 5));
    let mut mode = quarter_mode();
    mode.end = mode.start;

    assert!(scheduler.start(mode).is_err());
    assert!(!scheduler.is_running());
    assert!(scheduler.get_snapshot().is_none());
}

#[test]
fn restart_replaces_the_previous_run() {
    let mut scheduler = Scheduler::new(settings(10, 1_000));
    scheduler.start(quarter_mode()).unwrap();

    let mut other = quarter_mode();
    other.name = "other".into();
    other.starting_cash = 1_234.0;
    scheduler.start(other).unwrap();

    let snap = scheduler.get_snapshot().unwrap();
    assert_eq!(snap.mode, "other");
    assert!(snap.agents.iter().all(|a| a.starting_cash == 1_234.0));
    scheduler.stop();
}

#[test]
fn breaking_news_expires_on_the_wall_clock() {
    let mut mode = quarter_mode();
    mode.end = TurnDate::new(2020, 12);
    mode.events = vec![HistoricalEvent {
        id: "flash".into(),
        name: "Flash Crash".into(),
        description: String::new(),
        date: TurnDate::new(2020, 2),
        duration: 1,
        effects: vec![EventEffect::market(-5.0)],
    }];
    // ticks far apart, headline lifetime short
    let mut scheduler = Scheduler::new(EngineSettings {
        tick_interval: Duration::from_millis(300),
        restart_delay: Duration::from_secs(5),
        breaking_news_ttl: Duration::from_millis(40),
        provider_timeout: Duration::from_millis(100),
        seed: Some(3),
    });
    let rx = scheduler.events();
    scheduler.start(mode).unwrap();

    let raised = wait_for(&rx, Duration::from_secs(5), |e| {
        matches!(e, SimulationEvent::BreakingNewsRaised(n) if n.headline == "BREAKING: Flash Crash")
    });
    assert!(raised.is_some());

    let cleared = wait_for(&rx, Duration::from_millis(250), |e| {
        matches!(e, SimulationEvent::StateUpdated(s) if s.turn_number == 1 && s.breaking_news.is_none())
    });
    assert!(cleared.is_some(), "breaking news was not cleared before the next tick");
    scheduler.stop();
}

#[test]
fn modes_run_side_by_side_without_sharing_state() {
    let mut stocks = Scheduler::new(settings(5, 5_000));
    let mut crypto = Scheduler::new(settings(5, 5_000));
    stocks.start_builtin("stocks").unwrap();
    crypto.start_builtin("crypto").unwrap();

    std::thread::sleep(Duration::from_millis(100));
    stocks.stop();
    crypto.stop();

    let s = stocks.get_snapshot().unwrap();
    let c = crypto.get_snapshot().unwrap();
    assert_eq!(s.mode, "stocks");
    assert_eq!(c.mode, "crypto");
    assert!(s.turn_number > 0 && c.turn_number > 0);
    assert!(s.agents.iter().all(|a| a.starting_cash == 100_000.0));
    assert!(c.agents.iter().all(|a| a.starting_cash == 10_000.0));
}
