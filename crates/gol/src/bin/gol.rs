//! Run Game of Life with live keyboard control.
//!
//! Keys (followed by Enter): `p` pause/resume, `s` save a snapshot,
//! `q` quit, `k` quit and shut down remote workers or the broker.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gol::prelude::*;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "gol", version, about = "Run Game of Life with live keyboard control")]
struct Cli {
    /// Turn to stop at.
    #[arg(long, default_value_t = 10_000)]
    turns: u32,

    /// Bands each turn is split into.
    #[arg(short, long, default_value_t = 8)]
    threads: usize,

    /// Image width.
    #[arg(long, default_value_t = 512)]
    width: usize,

    /// Image height.
    #[arg(long, default_value_t = 512)]
    height: usize,

    /// Directory holding `{height}x{width}.pgm` input images.
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Directory snapshots are written to.
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Remote worker address. Repeat to use several workers.
    #[arg(long = "worker", value_name = "HOST:PORT", conflicts_with = "broker")]
    workers: Vec<String>,

    /// Broker address.
    #[arg(long, value_name = "HOST:PORT")]
    broker: Option<String>,

    /// Sub-bands each remote worker splits its band into.
    #[arg(long, default_value_t = 4)]
    band_threads: usize,

    /// Milliseconds between alive-cell reports.
    #[arg(long, default_value_t = 2000)]
    telemetry_ms: u64,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_keys: bool,
}

fn main() -> Result<()> {
    gol::init_tracing();
    let cli = Cli::parse();

    let config = RunConfig {
        turns: cli.turns,
        threads: cli.threads,
        width: cli.width,
        height: cli.height,
        telemetry_interval: Duration::from_millis(cli.telemetry_ms),
    };
    let store = Arc::new(PgmStore::new(&cli.images, &cli.out));
    let backend = backend(&cli)?;
    let coordinator =
        TurnCoordinator::new(config, backend, store).context("invalid run configuration")?;
    let run = RunHandle::spawn(coordinator).context("could not start run")?;

    if !cli.no_keys {
        gol::keys::spawn_reader(io::stdin(), run.commands())
            .context("could not start key reader")?;
    }

    for event in run.events().iter() {
        match event {
            Event::CellsFlipped { .. } => {}
            Event::TurnComplete { turn } => debug!(%turn, "turn complete"),
            other => info!(event = %other),
        }
    }

    let report = run.join().context("run failed")?;
    info!(
        final_turn = %report.final_turn,
        turns = report.turns_executed,
        exit = ?report.exit,
        total_ms = report.total_ms,
        "done"
    );
    Ok(())
}

fn backend(cli: &Cli) -> Result<Box<dyn TurnBackend>> {
    if let Some(addr) = &cli.broker {
        let broker =
            BrokerBackend::connect(addr).with_context(|| format!("connecting to broker {addr}"))?;
        return Ok(Box::new(broker));
    }
    if !cli.workers.is_empty() {
        let workers = RemoteWorkers::connect(&cli.workers, cli.band_threads)
            .context("connecting to workers")?;
        return Ok(Box::new(workers));
    }
    Ok(Box::new(
        LocalEngine::new(cli.threads).context("could not start band pool")?,
    ))
}
