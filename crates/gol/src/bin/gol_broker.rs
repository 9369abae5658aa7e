//! Hold a run's state and advance it on behalf of clients.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gol::rpc::{BrokerConfig, BrokerService, Server};

#[derive(Parser, Debug)]
#[command(name = "gol-broker", version, about = "Game of Life broker")]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8040")]
    listen: String,

    /// Worker address. Repeat for several; none computes locally.
    #[arg(long = "worker", value_name = "HOST:PORT")]
    workers: Vec<String>,

    /// Bands for local computation.
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Sub-bands each worker splits its band into.
    #[arg(long, default_value_t = 4)]
    band_threads: usize,

    /// Per-turn diff records kept for `Diff` requests.
    #[arg(long, default_value_t = 64)]
    history: usize,

    /// Milliseconds between a terminate request and shutdown.
    #[arg(long, default_value_t = 3000)]
    grace_ms: u64,
}

fn main() -> Result<()> {
    gol::init_tracing();
    let cli = Cli::parse();
    let service = BrokerService::new(BrokerConfig {
        workers: cli.workers,
        threads: cli.threads,
        band_threads: cli.band_threads,
        history: cli.history,
        terminate_grace: Duration::from_millis(cli.grace_ms),
    })
    .context("could not start broker")?;
    let server = Server::bind(&cli.listen, Arc::new(service))
        .with_context(|| format!("binding {}", cli.listen))?;
    server.serve()?;
    Ok(())
}
