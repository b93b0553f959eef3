#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
//! `slp` speaks the Minecraft Java Edition "Server List Ping" protocol. It
//! opens a TCP connection, sends the handshake and status request packets, and
//! decodes the server's JSON reply into a [`ServerStatus`] (player counts,
//! version name, MOTD and favicon) without ever entering the login state.
//!
//! The main API surface is [`crate::tokio::get_status`]. The lower level pieces
//! ([`varint`], [`frame`], [`handshake`], [`reader`]) are public so the wire
//! format can be reused or inspected on its own.

#[macro_use]
extern crate tracing;

pub mod frame;
pub mod handshake;
pub mod reader;
pub mod tokio;
pub mod varint;

mod status;

use std::time::Duration;

pub use handshake::StatusRequest;
pub use reader::Stage;
pub use status::{
    FALLBACK_MOTD, OFFLINE_MOTD, Players, ServerStatus, UNKNOWN_VERSION, normalize_motd,
};

/// Protocol version sent in the handshake unless overridden (1.8).
pub const DEFAULT_PROTOCOL_VERSION: i32 = 47;

/// Deadline applied to the connect step and to every read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur when querying a server's status.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection refused")]
    ConnectionRefused,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out while {0}")]
    Timeout(Stage),
    #[error("invalid packet ID: {got}")]
    UnexpectedPacketId { got: u32 },
    #[error("byte stream ended inside a VarInt")]
    TruncatedStream,
    #[error("VarInt is longer than 5 bytes")]
    VarintTooLong,
    #[error("a JSON error occurred: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("status response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("an I/O error occurred: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::ConnectionRefused => Self::ConnectionRefused,
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => Self::ConnectionClosed,
            ErrorKind::TimedOut => Self::Timeout(Stage::Connect),
            _ => Self::Io(error),
        }
    }
}
