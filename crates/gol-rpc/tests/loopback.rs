//! Integration test: workers and broker over loopback TCP.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use gol_core::{next_world, Command, Event, TurnId, World};
use gol_engine::{BackendError, ExitReason, RunConfig, RunHandle, TurnBackend, TurnCoordinator};
use gol_rpc::{
    BrokerBackend, BrokerClient, BrokerConfig, BrokerService, ErrorCode, RemoteWorkers, RpcError,
    RunningServer, Server, WorkerClient, WorkerConfig, WorkerService,
};
use gol_test_utils::{block, count, drain_events, glider, random_world, MemoryImageStore};

fn spawn_worker(grace: Duration) -> RunningServer {
    let service = WorkerService::new(WorkerConfig {
        threads: 2,
        terminate_grace: grace,
    })
    .unwrap();
    Server::bind("127.0.0.1:0", Arc::new(service))
        .unwrap()
        .spawn()
        .unwrap()
}

fn spawn_broker(workers: Vec<String>) -> RunningServer {
    let service = BrokerService::new(BrokerConfig {
        workers,
        threads: 2,
        band_threads: 2,
        history: 16,
        terminate_grace: Duration::from_millis(50),
    })
    .unwrap();
    Server::bind("127.0.0.1:0", Arc::new(service))
        .unwrap()
        .spawn()
        .unwrap()
}

fn addrs(servers: &[RunningServer]) -> Vec<String> {
    servers.iter().map(|s| s.addr().to_string()).collect()
}

fn run_config(size: usize, turns: u32) -> RunConfig {
    RunConfig {
        turns,
        threads: 2,
        width: size,
        height: size,
        telemetry_interval: Duration::from_secs(60),
    }
}

fn run<B: TurnBackend + 'static>(
    backend: B,
    world: &World,
    turns: u32,
) -> (Vec<Event>, gol_engine::RunReport) {
    let store = Arc::new(MemoryImageStore::with_input(world));
    let coordinator = TurnCoordinator::new(run_config(world.height(), turns), backend, store).unwrap();
    let handle = RunHandle::spawn(coordinator).unwrap();
    let events = drain_events(handle.events());
    (events, handle.join().unwrap())
}

// ── Workers ─────────────────────────────────────────────────────

#[test]
fn remote_workers_match_local_computation() {
    let servers: Vec<_> = (0..3).map(|_| spawn_worker(Duration::from_secs(3))).collect();
    let mut remote = RemoteWorkers::connect(&addrs(&servers), 2).unwrap();
    assert_eq!(remote.len(), 3);

    let mut world = Arc::new(random_world(17, 13, 35, 99));
    let mut reference = (*world).clone();
    for _ in 0..5 {
        world = Arc::new(remote.compute(&world).unwrap());
        reference = next_world(&reference);
        assert_eq!(*world, reference);
    }
}

#[test]
fn more_workers_than_rows() {
    let servers: Vec<_> = (0..4).map(|_| spawn_worker(Duration::from_secs(3))).collect();
    let mut remote = RemoteWorkers::connect(&addrs(&servers), 1).unwrap();
    let world = Arc::new(random_world(2, 9, 50, 3));
    assert_eq!(remote.compute(&world).unwrap(), next_world(&world));
}

#[test]
fn worker_rejects_band_outside_world() {
    let server = spawn_worker(Duration::from_secs(3));
    let mut client = WorkerClient::connect(&server.addr().to_string()).unwrap();
    let world = Arc::new(glider(6, 6));
    let err = client
        .compute_band(&world, gol_core::Band::new(0, 8, 0, 6), 1)
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::Remote {
            code: ErrorCode::InvalidRequest,
            ..
        }
    ));
    // The connection survives an application error.
    let band = gol_core::Band::new(0, 6, 0, 6);
    assert_eq!(client.compute_band(&world, band, 2).unwrap().len(), 36);
}

#[test]
fn terminate_stops_worker_after_grace() {
    let server = spawn_worker(Duration::from_millis(50));
    let mut client = WorkerClient::connect(&server.addr().to_string()).unwrap();
    client.terminate().unwrap();
    server.join().unwrap();
}

#[test]
fn unreachable_worker_fails_connect() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let res = RemoteWorkers::connect(&[format!("127.0.0.1:{port}")], 1);
    assert!(matches!(res, Err(BackendError::Unreachable { .. })));
}

#[test]
fn full_run_over_remote_workers() {
    let servers: Vec<_> = (0..2).map(|_| spawn_worker(Duration::from_secs(3))).collect();
    let remote = RemoteWorkers::connect(&addrs(&servers), 2).unwrap();
    let world = glider(8, 8);
    let (events, report) = run(remote, &world, 32);

    assert_eq!(report.final_turn, TurnId(32));
    // A glider on an 8x8 torus is back where it started after 32 turns.
    assert!(events.contains(&Event::FinalTurnComplete {
        turn: TurnId(32),
        alive: world.alive_cells(),
    }));
}

#[test]
fn kill_terminates_remote_workers() {
    let servers: Vec<_> = (0..2).map(|_| spawn_worker(Duration::from_millis(50))).collect();
    let remote = RemoteWorkers::connect(&addrs(&servers), 1).unwrap();
    let store = Arc::new(MemoryImageStore::with_input(&glider(8, 8)));
    let coordinator = TurnCoordinator::new(run_config(8, u32::MAX), remote, store).unwrap();
    let handle = RunHandle::spawn(coordinator).unwrap();
    handle.send(Command::Kill);
    drain_events(handle.events());
    assert_eq!(handle.join().unwrap().exit, ExitReason::Killed);
    for server in servers {
        server.join().unwrap();
    }
}

// ── Broker ──────────────────────────────────────────────────────

#[test]
fn run_through_broker_records_diffs() {
    let broker = spawn_broker(Vec::new());
    let endpoint = broker.addr().to_string();
    let world = random_world(12, 12, 30, 5);
    let (events, report) = run(BrokerBackend::connect(&endpoint).unwrap(), &world, 10);
    assert_eq!(report.turns_executed, 10);

    let mut client = BrokerClient::connect(&endpoint).unwrap();
    let recorded = client.diff(TurnId(10)).unwrap();
    let emitted = events
        .iter()
        .find_map(|e| match e {
            Event::CellsFlipped { turn, cells } if *turn == TurnId(10) => Some(cells.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(recorded, emitted);

    let (turn, world_10) = client.snapshot().unwrap();
    assert_eq!(turn, TurnId(10));
    let (_, alive) = client.status().unwrap();
    assert_eq!(alive, world_10.alive_count() as u64);
}

#[test]
fn broker_over_workers_matches_local() {
    let workers: Vec<_> = (0..2).map(|_| spawn_worker(Duration::from_secs(3))).collect();
    let broker = spawn_broker(addrs(&workers));
    let mut client = BrokerClient::connect(&broker.addr().to_string()).unwrap();
    let world = Arc::new(random_world(10, 10, 40, 11));
    client.load(&world, TurnId(0), TurnId(5)).unwrap();
    let (turn, next) = client.step(TurnId(0)).unwrap();
    assert_eq!(turn, TurnId(1));
    assert_eq!(*next, next_world(&world));
}

#[test]
fn broker_snapshot_and_status_track_steps() {
    let broker = spawn_broker(Vec::new());
    let mut client = BrokerClient::connect(&broker.addr().to_string()).unwrap();
    let world = Arc::new(block(6, 7));
    client.load(&world, TurnId(0), TurnId(10)).unwrap();
    for t in 0..3 {
        client.step(TurnId(t)).unwrap();
    }

    let (turn, snapshot) = client.snapshot().unwrap();
    assert_eq!(turn, TurnId(3));
    assert_eq!(snapshot, world);
    assert_eq!(client.status().unwrap(), (TurnId(3), 4));
    assert!(client.diff(TurnId(3)).unwrap().is_empty());
}

#[test]
fn unfinished_broker_run_is_resumed() {
    let broker = spawn_broker(Vec::new());
    let endpoint = broker.addr().to_string();
    let world = Arc::new(glider(8, 8));

    // An earlier client got to turn 5 of 20, then went away.
    {
        let mut client = BrokerClient::connect(&endpoint).unwrap();
        client.load(&world, TurnId(0), TurnId(20)).unwrap();
        for t in 0..5 {
            client.step(TurnId(t)).unwrap();
        }
    }

    let (events, report) = run(BrokerBackend::connect(&endpoint).unwrap(), &world, 20);
    assert!(matches!(
        events.first(),
        Some(Event::CellsFlipped { turn: TurnId(5), .. })
    ));
    assert_eq!(report.turns_executed, 15);
    assert_eq!(report.final_turn, TurnId(20));
    assert_eq!(count(&events, |e| matches!(e, Event::TurnComplete { .. })), 15);
}

#[test]
fn finished_broker_run_is_not_resumed() {
    let broker = spawn_broker(Vec::new());
    let endpoint = broker.addr().to_string();
    let world = glider(8, 8);

    let (_, first) = run(BrokerBackend::connect(&endpoint).unwrap(), &world, 6);
    assert_eq!(first.turns_executed, 6);
    let (_, second) = run(BrokerBackend::connect(&endpoint).unwrap(), &world, 6);
    assert_eq!(second.turns_executed, 6);
}

#[test]
fn broker_terminate_forwards_to_workers() {
    let workers: Vec<_> = (0..2).map(|_| spawn_worker(Duration::from_millis(50))).collect();
    let broker = spawn_broker(addrs(&workers));
    let mut client = BrokerClient::connect(&broker.addr().to_string()).unwrap();
    client.terminate().unwrap();
    broker.join().unwrap();
    for w in workers {
        w.join().unwrap();
    }
}
