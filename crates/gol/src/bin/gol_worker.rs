//! Serve band computations for remote runs.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use gol::rpc::{Server, WorkerConfig, WorkerService};

#[derive(Parser, Debug)]
#[command(name = "gol-worker", version, about = "Game of Life band worker")]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8030")]
    listen: String,

    /// Size of the band pool.
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Milliseconds between a terminate request and shutdown.
    #[arg(long, default_value_t = 3000)]
    grace_ms: u64,
}

fn main() -> Result<()> {
    gol::init_tracing();
    let cli = Cli::parse();
    let service = WorkerService::new(WorkerConfig {
        threads: cli.threads,
        terminate_grace: Duration::from_millis(cli.grace_ms),
    })
    .context("invalid worker configuration")?;
    let server = Server::bind(&cli.listen, Arc::new(service))
        .with_context(|| format!("binding {}", cli.listen))?;
    server.serve()?;
    Ok(())
}
