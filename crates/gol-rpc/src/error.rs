//! Error types for the wire protocol, servers and clients.

use std::fmt;
use std::io;

use gol_core::WorldError;
use thiserror::Error;

/// Machine-readable reason carried by an `Error` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// The request was malformed or not valid for this service.
    InvalidRequest = 1,
    /// A versioned request referred to a turn the service is not at.
    Conflict = 2,
    /// The requested record was never computed or has been evicted.
    NotAvailable = 3,
    /// The service holds no world yet.
    NoWorld = 4,
    /// The service could not compute the turn.
    Backend = 5,
}

impl ErrorCode {
    /// Decode a wire tag.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::InvalidRequest),
            2 => Some(Self::Conflict),
            3 => Some(Self::NotAvailable),
            4 => Some(Self::NoWorld),
            5 => Some(Self::Backend),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid request",
            Self::Conflict => "conflict",
            Self::NotAvailable => "not available",
            Self::NoWorld => "no world",
            Self::Backend => "backend failure",
        };
        f.write_str(s)
    }
}

/// Errors encoding, decoding or exchanging messages.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Transport failure (connect, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A frame header announced more than [`MAX_FRAME_LEN`](crate::codec::MAX_FRAME_LEN) bytes.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Announced length.
        len: usize,
        /// The limit.
        max: usize,
    },
    /// A payload could not be decoded (truncated, trailing or corrupt data).
    #[error("malformed frame: {detail}")]
    MalformedFrame {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// A message tag is not recognized.
    #[error("unknown message tag {tag:#04x}")]
    UnknownTag {
        /// The unrecognized tag.
        tag: u8,
    },
    /// A decoded world was invalid.
    #[error("invalid world: {0}")]
    World(#[from] WorldError),
    /// The peer answered with an `Error` response.
    #[error("remote error ({code}): {message}")]
    Remote {
        /// Reason code.
        code: ErrorCode,
        /// Peer-supplied description.
        message: String,
    },
    /// The peer answered with the wrong kind of response.
    #[error("expected {expected} response, got {got}")]
    UnexpectedResponse {
        /// Response kind the call expects.
        expected: &'static str,
        /// Response kind received.
        got: &'static str,
    },
}

impl RpcError {
    /// Whether the failure is at the transport level rather than a
    /// protocol or application error.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
