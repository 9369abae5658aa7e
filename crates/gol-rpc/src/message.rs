//! Request and response messages.
//!
//! | Tag    | Message                                  |
//! |--------|------------------------------------------|
//! | `0x01` | `ComputeBand { world, band, threads }`   |
//! | `0x02` | `Terminate`                              |
//! | `0x03` | `Load { world, turn, target }`           |
//! | `0x04` | `Step { from_turn }`                     |
//! | `0x05` | `Diff { turn }`                          |
//! | `0x06` | `Status`                                 |
//! | `0x07` | `Snapshot`                               |
//! | `0x08` | `Checkpoint`                             |
//! | `0x81` | `Band { cells }`                         |
//! | `0x82` | `Ack`                                    |
//! | `0x83` | `Turn { turn, world }`                   |
//! | `0x84` | `Diff { turn, flipped }`                 |
//! | `0x85` | `Status { turn, alive }`                 |
//! | `0x86` | `Checkpoint(Option<..>)`                 |
//! | `0xFF` | `Error { code, message }`                |

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use gol_core::{Band, Cell, CellCoord, TurnId, World};

use crate::codec::*;
use crate::error::{ErrorCode, RpcError};

/// A call from a client to a worker or broker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Compute the next generation of `band`, split into `threads`
    /// sub-bands on the worker.
    ComputeBand {
        /// The full current world.
        world: Arc<World>,
        /// Rectangle to compute.
        band: Band,
        /// Number of sub-bands.
        threads: u32,
    },
    /// Shut the service down after its grace delay.
    Terminate,
    /// Install a world as the broker's state at `turn`.
    Load {
        /// World at `turn`.
        world: Arc<World>,
        /// Turn `world` is the state after.
        turn: TurnId,
        /// Turn the run stops at.
        target: TurnId,
    },
    /// Advance from `from_turn` to `from_turn + 1`.
    Step {
        /// Turn the caller believes the broker is at.
        from_turn: TurnId,
    },
    /// Flipped cells recorded for exactly `turn`.
    Diff {
        /// Turn to look up.
        turn: TurnId,
    },
    /// Turn and alive count of the latest completed turn.
    Status,
    /// World of the latest completed turn.
    Snapshot,
    /// Resumable progress, if any.
    Checkpoint,
}

/// Broker progress a new client can resume from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointInfo {
    /// Latest completed turn.
    pub turn: TurnId,
    /// Turn the loading client was running to.
    pub target: TurnId,
    /// World at `turn`.
    pub world: Arc<World>,
}

/// A reply to a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Cells of a computed band, row-major.
    Band {
        /// Computed cells.
        cells: Vec<Cell>,
    },
    /// The request was accepted.
    Ack,
    /// A world and the turn it belongs to.
    Turn {
        /// Turn of `world`.
        turn: TurnId,
        /// The world.
        world: Arc<World>,
    },
    /// Recorded flipped cells of one turn.
    Diff {
        /// The turn.
        turn: TurnId,
        /// Flipped coordinates, row-major.
        flipped: Vec<CellCoord>,
    },
    /// Latest completed turn and its alive count.
    Status {
        /// Latest completed turn.
        turn: TurnId,
        /// Alive cells at `turn`.
        alive: u64,
    },
    /// Resumable progress.
    Checkpoint(Option<CheckpointInfo>),
    /// The request failed.
    Error {
        /// Reason.
        code: ErrorCode,
        /// Description.
        message: String,
    },
}

mod tag {
    pub const COMPUTE_BAND: u8 = 0x01;
    pub const TERMINATE: u8 = 0x02;
    pub const LOAD: u8 = 0x03;
    pub const STEP: u8 = 0x04;
    pub const DIFF: u8 = 0x05;
    pub const STATUS: u8 = 0x06;
    pub const SNAPSHOT: u8 = 0x07;
    pub const CHECKPOINT: u8 = 0x08;

    pub const R_BAND: u8 = 0x81;
    pub const R_ACK: u8 = 0x82;
    pub const R_TURN: u8 = 0x83;
    pub const R_DIFF: u8 = 0x84;
    pub const R_STATUS: u8 = 0x85;
    pub const R_CHECKPOINT: u8 = 0x86;
    pub const R_ERROR: u8 = 0xFF;
}

impl Request {
    /// Short name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ComputeBand { .. } => "ComputeBand",
            Self::Terminate => "Terminate",
            Self::Load { .. } => "Load",
            Self::Step { .. } => "Step",
            Self::Diff { .. } => "Diff",
            Self::Status => "Status",
            Self::Snapshot => "Snapshot",
            Self::Checkpoint => "Checkpoint",
        }
    }

    /// Encode as a frame payload.
    pub fn encode(&self) -> Result<Vec<u8>, RpcError> {
        let mut buf = Vec::new();
        let w: &mut dyn Write = &mut buf;
        match self {
            Self::ComputeBand {
                world,
                band,
                threads,
            } => {
                write_u8(w, tag::COMPUTE_BAND)?;
                write_world(w, world)?;
                write_band(w, band)?;
                write_u32_le(w, *threads)?;
            }
            Self::Terminate => write_u8(w, tag::TERMINATE)?,
            Self::Load {
                world,
                turn,
                target,
            } => {
                write_u8(w, tag::LOAD)?;
                write_world(w, world)?;
                write_turn(w, *turn)?;
                write_turn(w, *target)?;
            }
            Self::Step { from_turn } => {
                write_u8(w, tag::STEP)?;
                write_turn(w, *from_turn)?;
            }
            Self::Diff { turn } => {
                write_u8(w, tag::DIFF)?;
                write_turn(w, *turn)?;
            }
            Self::Status => write_u8(w, tag::STATUS)?,
            Self::Snapshot => write_u8(w, tag::SNAPSHOT)?,
            Self::Checkpoint => write_u8(w, tag::CHECKPOINT)?,
        }
        Ok(buf)
    }

    /// Decode a frame payload. Truncated or trailing bytes are
    /// [`RpcError::MalformedFrame`].
    pub fn decode(payload: &[u8]) -> Result<Self, RpcError> {
        Self::decode_from(payload).map_err(truncated)
    }

    fn decode_from(payload: &[u8]) -> Result<Self, RpcError> {
        let mut cur = Cursor::new(payload);
        let r: &mut dyn Read = &mut cur;
        let req = match read_u8(r)? {
            tag::COMPUTE_BAND => Self::ComputeBand {
                world: Arc::new(read_world(r)?),
                band: read_band(r)?,
                threads: read_u32_le(r)?,
            },
            tag::TERMINATE => Self::Terminate,
            tag::LOAD => Self::Load {
                world: Arc::new(read_world(r)?),
                turn: read_turn(r)?,
                target: read_turn(r)?,
            },
            tag::STEP => Self::Step {
                from_turn: read_turn(r)?,
            },
            tag::DIFF => Self::Diff {
                turn: read_turn(r)?,
            },
            tag::STATUS => Self::Status,
            tag::SNAPSHOT => Self::Snapshot,
            tag::CHECKPOINT => Self::Checkpoint,
            other => return Err(RpcError::UnknownTag { tag: other }),
        };
        expect_consumed(&cur)?;
        Ok(req)
    }
}

impl Response {
    /// Short name for log lines and mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Band { .. } => "Band",
            Self::Ack => "Ack",
            Self::Turn { .. } => "Turn",
            Self::Diff { .. } => "Diff",
            Self::Status { .. } => "Status",
            Self::Checkpoint(_) => "Checkpoint",
            Self::Error { .. } => "Error",
        }
    }

    /// Shorthand for an `Error` response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Encode as a frame payload.
    pub fn encode(&self) -> Result<Vec<u8>, RpcError> {
        let mut buf = Vec::new();
        let w: &mut dyn Write = &mut buf;
        match self {
            Self::Band { cells } => {
                write_u8(w, tag::R_BAND)?;
                write_cells(w, cells)?;
            }
            Self::Ack => write_u8(w, tag::R_ACK)?,
            Self::Turn { turn, world } => {
                write_u8(w, tag::R_TURN)?;
                write_turn(w, *turn)?;
                write_world(w, world)?;
            }
            Self::Diff { turn, flipped } => {
                write_u8(w, tag::R_DIFF)?;
                write_turn(w, *turn)?;
                write_coords(w, flipped)?;
            }
            Self::Status { turn, alive } => {
                write_u8(w, tag::R_STATUS)?;
                write_turn(w, *turn)?;
                write_u64_le(w, *alive)?;
            }
            Self::Checkpoint(cp) => {
                write_u8(w, tag::R_CHECKPOINT)?;
                match cp {
                    None => write_u8(w, 0)?,
                    Some(cp) => {
                        write_u8(w, 1)?;
                        write_turn(w, cp.turn)?;
                        write_turn(w, cp.target)?;
                        write_world(w, &cp.world)?;
                    }
                }
            }
            Self::Error { code, message } => {
                write_u8(w, tag::R_ERROR)?;
                write_u8(w, *code as u8)?;
                write_str(w, message)?;
            }
        }
        Ok(buf)
    }

    /// Decode a frame payload. Truncated or trailing bytes are
    /// [`RpcError::MalformedFrame`].
    pub fn decode(payload: &[u8]) -> Result<Self, RpcError> {
        Self::decode_from(payload).map_err(truncated)
    }

    fn decode_from(payload: &[u8]) -> Result<Self, RpcError> {
        let mut cur = Cursor::new(payload);
        let r: &mut dyn Read = &mut cur;
        let resp = match read_u8(r)? {
            tag::R_BAND => Self::Band {
                cells: read_cells(r)?,
            },
            tag::R_ACK => Self::Ack,
            tag::R_TURN => Self::Turn {
                turn: read_turn(r)?,
                world: Arc::new(read_world(r)?),
            },
            tag::R_DIFF => Self::Diff {
                turn: read_turn(r)?,
                flipped: read_coords(r)?,
            },
            tag::R_STATUS => Self::Status {
                turn: read_turn(r)?,
                alive: read_u64_le(r)?,
            },
            tag::R_CHECKPOINT => match read_u8(r)? {
                0 => Self::Checkpoint(None),
                1 => Self::Checkpoint(Some(CheckpointInfo {
                    turn: read_turn(r)?,
                    target: read_turn(r)?,
                    world: Arc::new(read_world(r)?),
                })),
                other => {
                    return Err(RpcError::MalformedFrame {
                        detail: format!("checkpoint presence flag {other}"),
                    })
                }
            },
            tag::R_ERROR => {
                let raw = read_u8(r)?;
                let code = ErrorCode::from_u8(raw).ok_or_else(|| RpcError::MalformedFrame {
                    detail: format!("unknown error code {raw}"),
                })?;
                Self::Error {
                    code,
                    message: read_str(r)?,
                }
            }
            other => return Err(RpcError::UnknownTag { tag: other }),
        };
        expect_consumed(&cur)?;
        Ok(resp)
    }

    /// Turn an `Error` response into [`RpcError::Remote`].
    pub fn into_result(self) -> Result<Self, RpcError> {
        match self {
            Self::Error { code, message } => Err(RpcError::Remote { code, message }),
            other => Ok(other),
        }
    }
}

/// Reading from an in-memory payload only fails when it runs out.
fn truncated(e: RpcError) -> RpcError {
    match e {
        RpcError::Io(e) => RpcError::MalformedFrame {
            detail: format!("truncated payload: {e}"),
        },
        other => other,
    }
}

fn expect_consumed(cur: &Cursor<&[u8]>) -> Result<(), RpcError> {
    let total = cur.get_ref().len() as u64;
    if cur.position() != total {
        return Err(RpcError::MalformedFrame {
            detail: format!("{} trailing bytes", total - cur.position()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Arc<World> {
        let alive = [(1, 0), (2, 1), (0, 2)].map(CellCoord::from);
        Arc::new(World::with_alive(4, 6, alive).unwrap())
    }

    #[test]
    fn compute_band_payload_layout() {
        let req = Request::ComputeBand {
            world: world(),
            band: Band::new(1, 3, 0, 6),
            threads: 2,
        };
        let bytes = req.encode().unwrap();
        assert_eq!(bytes[0], 0x01);
        // tag + world (4 + 4 + 4 + 24) + band (16) + threads (4)
        assert_eq!(bytes.len(), 1 + 36 + 16 + 4);
        assert_eq!(Request::decode(&bytes).unwrap(), req);
    }

    #[test]
    fn every_response_kind_decodes() {
        let responses = vec![
            Response::Band {
                cells: vec![Cell::Alive, Cell::Dead],
            },
            Response::Ack,
            Response::Turn {
                turn: TurnId(7),
                world: world(),
            },
            Response::Diff {
                turn: TurnId(3),
                flipped: vec![CellCoord::new(5, 1), CellCoord::new(0, 3)],
            },
            Response::Status {
                turn: TurnId(9),
                alive: 42,
            },
            Response::Checkpoint(None),
            Response::Checkpoint(Some(CheckpointInfo {
                turn: TurnId(10),
                target: TurnId(100),
                world: world(),
            })),
            Response::error(ErrorCode::Conflict, "broker at turn 4"),
        ];
        for resp in responses {
            let bytes = resp.encode().unwrap();
            assert_eq!(Response::decode(&bytes).unwrap(), resp, "{}", resp.kind());
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(matches!(
            Request::decode(&[0x42]),
            Err(RpcError::UnknownTag { tag: 0x42 })
        ));
        assert!(matches!(
            Response::decode(&[0x01]),
            Err(RpcError::UnknownTag { tag: 0x01 })
        ));
    }

    #[test]
    fn trailing_bytes_rejected() {
        let mut bytes = Request::Status.encode().unwrap();
        bytes.push(0);
        assert!(matches!(
            Request::decode(&bytes),
            Err(RpcError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn truncated_payload_is_malformed() {
        assert!(matches!(
            Request::decode(&[]),
            Err(RpcError::MalformedFrame { .. })
        ));
        let bytes = Request::Step {
            from_turn: TurnId(3),
        }
        .encode()
        .unwrap();
        assert!(matches!(
            Request::decode(&bytes[..3]),
            Err(RpcError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn error_response_becomes_remote_error() {
        let err = Response::error(ErrorCode::NotAvailable, "evicted")
            .into_result()
            .unwrap_err();
        assert!(matches!(
            err,
            RpcError::Remote {
                code: ErrorCode::NotAvailable,
                ..
            }
        ));
        assert!(Response::Ack.into_result().is_ok());
    }
}
