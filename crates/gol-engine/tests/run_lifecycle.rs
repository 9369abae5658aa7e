//! Integration test: event order and reports for whole runs.

use std::sync::Arc;
use std::time::Duration;

use gol_core::{Command, Event, State, TurnId, World};
use gol_engine::{
    BackendError, Checkpoint, ExitReason, ImageError, LocalEngine, RunConfig, RunError,
    RunHandle, TurnBackend, TurnCoordinator,
};
use gol_test_utils::{blinker, count, drain_events, glider, FailingBackend, MemoryImageStore};

fn config(size: usize, turns: u32, threads: usize) -> RunConfig {
    RunConfig {
        turns,
        threads,
        width: size,
        height: size,
        telemetry_interval: Duration::from_secs(60),
    }
}

fn spawn<B: TurnBackend + 'static>(
    cfg: RunConfig,
    backend: B,
    store: &Arc<MemoryImageStore>,
) -> RunHandle {
    let coordinator = TurnCoordinator::new(cfg, backend, store.clone()).unwrap();
    RunHandle::spawn(coordinator).unwrap()
}

#[test]
fn completed_run_emits_lifecycle_in_order() {
    let world = blinker(5);
    let store = Arc::new(MemoryImageStore::with_input(&world));
    let run = spawn(config(5, 10, 2), LocalEngine::new(2).unwrap(), &store);

    let events = drain_events(run.events());
    let report = run.join().unwrap();

    assert_eq!(
        events[0],
        Event::CellsFlipped {
            turn: TurnId(0),
            cells: world.alive_cells(),
        }
    );
    assert_eq!(
        events[1],
        Event::StateChange {
            turn: TurnId(0),
            state: State::Executing,
        }
    );
    for k in 1..=10u32 {
        let flipped = &events[2 * k as usize];
        let complete = &events[2 * k as usize + 1];
        assert!(
            matches!(flipped, Event::CellsFlipped { turn, cells } if *turn == TurnId(k) && cells.len() == 4),
            "turn {k}: {flipped:?}"
        );
        assert_eq!(*complete, Event::TurnComplete { turn: TurnId(k) });
    }
    assert_eq!(
        &events[22..],
        &[
            Event::FinalTurnComplete {
                turn: TurnId(10),
                alive: world.alive_cells(),
            },
            Event::ImageOutputComplete {
                turn: TurnId(10),
                filename: "5x5x10".into(),
            },
            Event::StateChange {
                turn: TurnId(10),
                state: State::Quitting,
            },
        ]
    );

    assert_eq!(report.final_turn, TurnId(10));
    assert_eq!(report.turns_executed, 10);
    assert_eq!(report.exit, ExitReason::Completed);
    assert_eq!(store.saved("5x5x10"), Some(world.to_bytes()));
}

#[test]
fn turn_numbers_strictly_increase() {
    let world = glider(8, 8);
    let store = Arc::new(MemoryImageStore::with_input(&world));
    let run = spawn(config(8, 40, 3), LocalEngine::new(3).unwrap(), &store);
    let events = drain_events(run.events());
    run.join().unwrap();

    let completed: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::TurnComplete { turn } => Some(turn.0),
            _ => None,
        })
        .collect();
    assert_eq!(completed, (1..=40).collect::<Vec<_>>());

    // Every CellsFlipped for turn k comes right before TurnComplete(k).
    for pair in events.windows(2) {
        if let Event::TurnComplete { turn } = &pair[1] {
            assert!(matches!(&pair[0], Event::CellsFlipped { turn: t, .. } if t == turn));
        }
    }
}

#[test]
fn zero_turns_finishes_immediately() {
    let world = blinker(5);
    let store = Arc::new(MemoryImageStore::with_input(&world));
    let run = spawn(config(5, 0, 1), LocalEngine::new(1).unwrap(), &store);
    let events = drain_events(run.events());
    let report = run.join().unwrap();

    assert_eq!(count(&events, |e| matches!(e, Event::TurnComplete { .. })), 0);
    assert_eq!(count(&events, |e| matches!(e, Event::FinalTurnComplete { .. })), 1);
    assert_eq!(report.final_turn, TurnId(0));
    assert_eq!(store.saved("5x5x0"), Some(world.to_bytes()));
}

#[test]
fn missing_image_fails_before_any_event() {
    let store = Arc::new(MemoryImageStore::new());
    let run = spawn(config(5, 10, 1), LocalEngine::new(1).unwrap(), &store);
    let events = drain_events(run.events());
    assert!(events.is_empty());
    assert!(matches!(
        run.join(),
        Err(RunError::Image(ImageError::NotFound { .. }))
    ));
}

#[test]
fn wrong_sized_image_is_rejected() {
    let store = Arc::new(MemoryImageStore::new());
    store.insert("5x5", vec![0; 24]);
    let run = spawn(config(5, 10, 1), LocalEngine::new(1).unwrap(), &store);
    assert!(matches!(
        run.join(),
        Err(RunError::Image(ImageError::SizeMismatch {
            expected: 25,
            actual: 24,
            ..
        }))
    ));
}

#[test]
fn backend_failure_stops_run_with_quitting() {
    let world = blinker(5);
    let store = Arc::new(MemoryImageStore::with_input(&world));
    let run = spawn(config(5, 10, 1), FailingBackend::new(TurnId(3)), &store);
    let events = drain_events(run.events());

    assert_eq!(
        events.last(),
        Some(&Event::StateChange {
            turn: TurnId(3),
            state: State::Quitting,
        })
    );
    assert_eq!(count(&events, |e| matches!(e, Event::FinalTurnComplete { .. })), 0);
    assert_eq!(count(&events, |e| matches!(e, Event::TurnComplete { .. })), 3);
    assert!(matches!(
        run.join(),
        Err(RunError::Backend(BackendError::Unreachable { .. }))
    ));
}

#[test]
fn invalid_config_rejected_at_construction() {
    let store = Arc::new(MemoryImageStore::new());
    let cfg = RunConfig {
        threads: 0,
        ..config(5, 1, 1)
    };
    assert!(TurnCoordinator::new(cfg, LocalEngine::new(1).unwrap(), store).is_err());
}

// ── Checkpoint resume ───────────────────────────────────────────────

struct Resumable {
    inner: LocalEngine,
    checkpoint: Option<Checkpoint>,
}

impl TurnBackend for Resumable {
    fn name(&self) -> &str {
        "resumable"
    }

    fn checkpoint(
        &mut self,
        _initial: &World,
        _target: TurnId,
    ) -> Result<Option<Checkpoint>, BackendError> {
        Ok(self.checkpoint.take())
    }

    fn advance(&mut self, world: &Arc<World>, _turn: TurnId) -> Result<World, BackendError> {
        self.inner.step(world)
    }
}

#[test]
fn resumes_from_checkpoint_below_target() {
    let initial = glider(8, 8);
    let saved = glider(8, 8);
    let store = Arc::new(MemoryImageStore::with_input(&initial));
    let backend = Resumable {
        inner: LocalEngine::new(2).unwrap(),
        checkpoint: Some(Checkpoint {
            turn: TurnId(5),
            world: saved.clone(),
        }),
    };
    let run = spawn(config(8, 8, 2), backend, &store);
    let events = drain_events(run.events());
    let report = run.join().unwrap();

    assert_eq!(
        events[0],
        Event::CellsFlipped {
            turn: TurnId(5),
            cells: saved.alive_cells(),
        }
    );
    assert_eq!(count(&events, |e| matches!(e, Event::TurnComplete { .. })), 3);
    assert_eq!(report.final_turn, TurnId(8));
    assert_eq!(report.turns_executed, 3);
}

#[test]
fn checkpoint_at_target_is_ignored() {
    let initial = blinker(5);
    let store = Arc::new(MemoryImageStore::with_input(&initial));
    let backend = Resumable {
        inner: LocalEngine::new(1).unwrap(),
        checkpoint: Some(Checkpoint {
            turn: TurnId(4),
            world: initial.clone(),
        }),
    };
    let run = spawn(config(5, 4, 1), backend, &store);
    drain_events(run.events());
    let report = run.join().unwrap();
    assert_eq!(report.turns_executed, 4);
}

#[test]
fn kill_reports_killed() {
    let world = blinker(5);
    let store = Arc::new(MemoryImageStore::with_input(&world));
    let run = spawn(config(5, u32::MAX, 1), LocalEngine::new(1).unwrap(), &store);
    assert!(run.send(Command::Kill));
    let events = drain_events(run.events());
    let report = run.join().unwrap();

    assert_eq!(report.exit, ExitReason::Killed);
    assert_eq!(count(&events, |e| matches!(e, Event::FinalTurnComplete { .. })), 1);
    assert!(matches!(
        events.last(),
        Some(Event::StateChange {
            state: State::Quitting,
            ..
        })
    ));
}
