//! Outbound packets: the handshake and the status request.
//! [Server List Ping](https://wiki.vg/Server_List_Ping)

use std::time::Duration;

use crate::{DEFAULT_PROTOCOL_VERSION, DEFAULT_TIMEOUT, frame::frame, varint};

const HANDSHAKE_ID: u8 = 0x00;
const NEXT_STATE_STATUS: u32 = 1;

/// The status request is always an empty packet with ID `0x00`.
pub const STATUS_REQUEST: [u8; 2] = [0x01, 0x00];

/// Configuration for querying a Java server's status.
///
/// # Examples
///
/// ```
/// use slp::StatusRequest;
/// use std::time::Duration;
///
/// let request = StatusRequest::new("mc.example.com", 25565)
///     .with_timeout(Duration::from_secs(2));
/// assert_eq!(request.protocol_version(), 47);
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct StatusRequest {
    host: String,
    port: u16,
    protocol_version: i32,
    timeout: Duration,
}

impl StatusRequest {
    /// Creates a request with protocol version 47 and a five second timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// See [Protocol Version Numbers](https://wiki.vg/Protocol_version_numbers).
    #[must_use]
    pub fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub const fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    /// Deadline for the connect step and for each read and write after it.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builds the framed handshake packet asking the server to switch to the
/// status state.
///
/// The port goes out as a big-endian unsigned short, not a VarInt.
#[must_use]
pub fn build_handshake(request: &StatusRequest) -> Vec<u8> {
    let host = request.host.as_bytes();
    let mut body = Vec::with_capacity(host.len() + 12);
    body.push(HANDSHAKE_ID);
    #[allow(clippy::cast_sign_loss)]
    varint::write(&mut body, request.protocol_version as u32);
    #[allow(clippy::cast_possible_truncation)]
    varint::write(&mut body, host.len() as u32);
    body.extend_from_slice(host);
    body.extend_from_slice(&request.port.to_be_bytes());
    varint::write(&mut body, NEXT_STATE_STATUS);
    frame(&body)
}

#[must_use]
pub const fn build_status_request() -> [u8; 2] {
    STATUS_REQUEST
}
