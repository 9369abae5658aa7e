//! Blocking clients for the worker and broker services.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;

use gol_core::{Band, Cell, CellCoord, TurnId, World};
use gol_engine::BackendError;

use crate::codec::{read_frame, write_frame};
use crate::error::RpcError;
use crate::message::{CheckpointInfo, Request, Response};

/// One connection, one call at a time.
pub struct RpcClient {
    endpoint: String,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl RpcClient {
    /// Connect to `endpoint` (`host:port`).
    pub fn connect(endpoint: &str) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(endpoint)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            endpoint: endpoint.to_owned(),
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// The address this client was connected with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `request` and wait for the response. `Error` responses are
    /// returned as [`RpcError::Remote`].
    pub fn call(&mut self, request: &Request) -> Result<Response, RpcError> {
        write_frame(&mut self.writer, &request.encode()?)?;
        let payload = read_frame(&mut self.reader)?;
        Response::decode(&payload)?.into_result()
    }

    /// Map a failed call onto the engine's backend error.
    pub fn backend_error(&self, err: RpcError) -> BackendError {
        if err.is_transport() {
            BackendError::Unreachable {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            }
        } else {
            BackendError::Remote {
                endpoint: self.endpoint.clone(),
                reason: err.to_string(),
            }
        }
    }
}

fn unexpected(expected: &'static str, got: &Response) -> RpcError {
    RpcError::UnexpectedResponse {
        expected,
        got: got.kind(),
    }
}

fn expect_ack(resp: Response) -> Result<(), RpcError> {
    match resp {
        Response::Ack => Ok(()),
        other => Err(unexpected("Ack", &other)),
    }
}

fn expect_turn(resp: Response) -> Result<(TurnId, Arc<World>), RpcError> {
    match resp {
        Response::Turn { turn, world } => Ok((turn, world)),
        other => Err(unexpected("Turn", &other)),
    }
}

// ── WorkerClient ────────────────────────────────────────────────

/// Client for a remote band worker.
pub struct WorkerClient {
    rpc: RpcClient,
}

impl WorkerClient {
    /// Connect to a worker.
    pub fn connect(endpoint: &str) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::connect(endpoint)?,
        })
    }

    /// The underlying connection.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Compute the next generation of `band` of `world`.
    pub fn compute_band(
        &mut self,
        world: &Arc<World>,
        band: Band,
        threads: u32,
    ) -> Result<Vec<Cell>, RpcError> {
        let req = Request::ComputeBand {
            world: Arc::clone(world),
            band,
            threads,
        };
        match self.rpc.call(&req)? {
            Response::Band { cells } if cells.len() == band.len() => Ok(cells),
            Response::Band { cells } => Err(RpcError::MalformedFrame {
                detail: format!("band of {} cells, expected {}", cells.len(), band.len()),
            }),
            other => Err(unexpected("Band", &other)),
        }
    }

    /// Ask the worker to shut down.
    pub fn terminate(&mut self) -> Result<(), RpcError> {
        expect_ack(self.rpc.call(&Request::Terminate)?)
    }
}

// ── BrokerClient ────────────────────────────────────────────────

/// Client for a broker.
pub struct BrokerClient {
    rpc: RpcClient,
}

impl BrokerClient {
    /// Connect to a broker.
    pub fn connect(endpoint: &str) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::connect(endpoint)?,
        })
    }

    /// The underlying connection.
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Install `world` as the state after `turn` of a run to `target`.
    pub fn load(&mut self, world: &Arc<World>, turn: TurnId, target: TurnId) -> Result<(), RpcError> {
        expect_ack(self.rpc.call(&Request::Load {
            world: Arc::clone(world),
            turn,
            target,
        })?)
    }

    /// Advance from `from_turn`; returns the new turn and world.
    pub fn step(&mut self, from_turn: TurnId) -> Result<(TurnId, Arc<World>), RpcError> {
        expect_turn(self.rpc.call(&Request::Step { from_turn })?)
    }

    /// Flipped cells recorded for `turn`.
    pub fn diff(&mut self, turn: TurnId) -> Result<Vec<CellCoord>, RpcError> {
        match self.rpc.call(&Request::Diff { turn })? {
            Response::Diff { turn: t, flipped } if t == turn => Ok(flipped),
            other => Err(unexpected("Diff", &other)),
        }
    }

    /// Latest completed turn and its alive count.
    pub fn status(&mut self) -> Result<(TurnId, u64), RpcError> {
        match self.rpc.call(&Request::Status)? {
            Response::Status { turn, alive } => Ok((turn, alive)),
            other => Err(unexpected("Status", &other)),
        }
    }

    /// World of the latest completed turn.
    pub fn snapshot(&mut self) -> Result<(TurnId, Arc<World>), RpcError> {
        expect_turn(self.rpc.call(&Request::Snapshot)?)
    }

    /// Resumable progress, if the broker holds any.
    pub fn checkpoint(&mut self) -> Result<Option<CheckpointInfo>, RpcError> {
        match self.rpc.call(&Request::Checkpoint)? {
            Response::Checkpoint(cp) => Ok(cp),
            other => Err(unexpected("Checkpoint", &other)),
        }
    }

    /// Ask the broker (and its workers) to shut down.
    pub fn terminate(&mut self) -> Result<(), RpcError> {
        expect_ack(self.rpc.call(&Request::Terminate)?)
    }
}
