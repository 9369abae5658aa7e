//! Integration test: a local run reading and writing PGM directories.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gol::pgm;
use gol::prelude::*;
use gol_test_utils::{blinker, drain_events, glider};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gol-run-{tag}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(height: usize, width: usize, turns: u32) -> RunConfig {
    RunConfig {
        turns,
        threads: 3,
        width,
        height,
        telemetry_interval: Duration::from_secs(60),
    }
}

#[test]
fn run_writes_final_snapshot_as_pgm() {
    let dir = scratch_dir("final");
    let world = blinker(6);
    fs::write(dir.join("6x6.pgm"), pgm::encode(6, 6, &world.to_bytes())).unwrap();

    let store = Arc::new(PgmStore::new(&dir, dir.join("out")));
    let coordinator =
        TurnCoordinator::new(config(6, 6, 4), LocalEngine::new(3).unwrap(), store).unwrap();
    let run = RunHandle::spawn(coordinator).unwrap();
    let events = drain_events(run.events());
    run.join().unwrap();

    assert!(events.contains(&Event::ImageOutputComplete {
        turn: TurnId(4),
        filename: "6x6x4".into(),
    }));
    let data = fs::read(dir.join("out").join("6x6x4.pgm")).unwrap();
    assert_eq!(pgm::decode("6x6x4", &data, 6, 6).unwrap(), world.to_bytes());
    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn non_square_names_use_height_then_width_on_input() {
    let dir = scratch_dir("names");
    let world = glider(4, 9);
    fs::write(dir.join("4x9.pgm"), pgm::encode(4, 9, &world.to_bytes())).unwrap();

    let store = Arc::new(PgmStore::new(&dir, &dir));
    let coordinator =
        TurnCoordinator::new(config(4, 9, 1), LocalEngine::new(2).unwrap(), store).unwrap();
    let run = RunHandle::spawn(coordinator).unwrap();
    drain_events(run.events());
    run.join().unwrap();

    assert!(dir.join("9x4x1.pgm").exists());
    fs::remove_dir_all(dir).unwrap();
}
