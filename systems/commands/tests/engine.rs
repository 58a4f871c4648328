use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use maple_bot_core::{Clock, Position};
use maple_bot_system_commands::{keys, Config, Engine, Routine, Tuning};
use maple_bot_world::{
    simulation::{KeyEvent, SimulatedGame, SimulationConfig},
    EnabledSwitch, SharedState, WaypointGraph,
};

struct Harness {
    state: SharedState,
    switch: EnabledSwitch,
    game: Arc<SimulatedGame>,
    engine: Engine,
}

fn harness(text: &str, seed: u64) -> Harness {
    harness_with_clock(text, seed, None)
}

fn harness_with_clock(text: &str, seed: u64, clock: Option<Arc<dyn Clock>>) -> Harness {
    let (state, handles) = SharedState::create();
    let game = Arc::new(SimulatedGame::new(
        SimulationConfig::default(),
        handles.producer,
        Position::new(0.0, 0.0),
    ));
    let routine = Routine::parse(text).expect("valid routine");
    let clock: Arc<dyn Clock> = match clock {
        Some(clock) => clock,
        None => game.clone(),
    };
    let engine = Engine::new(
        Config::new(Tuning::default(), Some(seed)),
        routine,
        Box::new(WaypointGraph::new(0.15)),
        game.clone(),
        clock,
        state.clone(),
        handles.cursor,
    );
    handles.switch.enable();
    Harness {
        state,
        switch: handles.switch,
        game,
        engine,
    }
}

#[test]
fn steps_advance_and_wrap_the_cursor() {
    let mut harness = harness("@, label=start\nTengu\nGoto, start\n", 1);

    assert!(harness.engine.step());
    assert_eq!(harness.engine.cursor(), 1);
    assert!(harness.engine.step());
    assert_eq!(harness.engine.cursor(), 2);
    assert_eq!(harness.game.presses_of(keys::TENGU), 1);

    assert!(harness.engine.step());
    assert_eq!(harness.engine.cursor(), 1, "goto resumes after the label");
    assert_eq!(harness.state.seq_index(), 1);
}

#[test]
fn cursor_wraps_to_the_start() {
    let mut harness = harness("Tengu\nDomain\n", 1);

    assert!(harness.engine.step());
    assert!(harness.engine.step());

    assert_eq!(harness.engine.cursor(), 0);
    assert_eq!(harness.state.seq_index(), 0);
}

#[test]
fn disabled_engine_does_not_step() {
    let mut harness = harness("Tengu\n", 1);
    harness.switch.disable();

    assert!(!harness.engine.step());
    assert!(harness.game.key_log().is_empty());
}

#[test]
fn empty_routine_does_not_step() {
    let mut harness = harness("# nothing\n", 1);
    assert!(!harness.engine.step());
}

#[test]
fn points_move_then_run_their_commands() {
    let mut harness = harness("*, x=0.5, y=0.5\n    Tengu\n", 1);

    assert!(harness.engine.step());

    assert!(harness.state.player_pos().distance(Position::new(0.5, 0.5)) <= 0.1);
    let log = harness.game.key_log();
    assert_eq!(
        log.last(),
        Some(&KeyEvent::Press {
            key: keys::TENGU,
            count: 1
        })
    );
}

#[test]
fn run_returns_once_shutdown_is_raised() {
    let mut harness = harness("Tengu\n", 1);
    let shutdown = AtomicBool::new(true);

    harness.engine.run(&shutdown);

    assert!(harness.game.key_log().is_empty());
}

#[test]
fn same_seed_replays_identical_key_logs() {
    let routine = "\
*, x=0.9, y=0.1
    Kishin
*, x=0.1, y=0.1
    Tengu
";
    let replay = |seed| {
        let mut harness = harness(routine, seed);
        for _ in 0..4 {
            assert!(harness.engine.step());
        }
        (harness.game.key_log(), harness.state.player_pos())
    };

    let (first_log, first_position) = replay(42);
    let (second_log, second_position) = replay(42);

    assert!(!first_log.is_empty());
    assert_eq!(first_log, second_log, "replay diverged between runs");
    assert_eq!(first_position, second_position);
}

/// Clock that raises the shutdown flag after a number of sleeps.
struct ShutdownClock {
    now: Mutex<Duration>,
    sleeps: AtomicU32,
    after: u32,
    shutdown: Arc<AtomicBool>,
}

impl Clock for ShutdownClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
        if self.sleeps.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.shutdown.store(true, Ordering::SeqCst);
        }
    }
}

#[test]
fn label_and_goto_loops_idle_between_passes() {
    let shutdown = Arc::new(AtomicBool::new(false));
    let clock = Arc::new(ShutdownClock {
        now: Mutex::new(Duration::ZERO),
        sleeps: AtomicU32::new(0),
        after: 3,
        shutdown: Arc::clone(&shutdown),
    });
    let mut harness = harness_with_clock("@, label=top\nGoto, top\n", 1, Some(clock.clone()));

    harness.engine.run(&shutdown);

    assert_eq!(clock.sleeps.load(Ordering::SeqCst), 3);
    assert_eq!(clock.now(), Duration::from_millis(30));
    assert!(harness.game.key_log().is_empty());
}
