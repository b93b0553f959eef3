//! The response half of the exchange.
//!
//! The status response is read field by field, each read bounded by its own
//! deadline:
//!
//! ```text
//! AwaitLength -> AwaitPacketId -> AwaitJsonLength -> AwaitJsonBytes -> Done
//! ```
//!
//! Any failure along the way is terminal.

use std::{fmt, future::Future, time::Duration};

use tokio::io::AsyncRead;

use crate::{Error, frame::read_exact_len, varint::read_varint};

const STATUS_RESPONSE_ID: u32 = 0x00;

/// A step of the exchange, used to report where a deadline expired.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Stage {
    Connect,
    SendRequest,
    AwaitLength,
    AwaitPacketId,
    AwaitJsonLength,
    AwaitJsonBytes,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connecting",
            Self::SendRequest => "sending the status request",
            Self::AwaitLength => "reading the packet length",
            Self::AwaitPacketId => "reading the packet ID",
            Self::AwaitJsonLength => "reading the JSON length",
            Self::AwaitJsonBytes => "reading the JSON payload",
        })
    }
}

/// Runs `fut` with `deadline`, reporting expiry as a timeout in `stage`.
pub(crate) async fn bounded<T, F>(stage: Stage, deadline: Duration, fut: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(stage)),
    }
}

/// Reads a status response packet and returns its JSON payload.
///
/// `deadline` applies to each read separately, so a server trickling bytes
/// can hold the connection for at most four deadlines.
///
/// # Errors
/// [`Error::UnexpectedPacketId`] if the packet isn't a status response,
/// [`Error::ConnectionClosed`] if the stream ends early,
/// [`Error::Timeout`] if a read doesn't finish in time and
/// [`Error::InvalidUtf8`] if the payload isn't UTF-8.
pub async fn read_status<R: AsyncRead + Unpin>(
    reader: &mut R,
    deadline: Duration,
) -> Result<String, Error> {
    let length = bounded(Stage::AwaitLength, deadline, read_varint(reader)).await?;
    trace!(length, "got status response length");

    let id = bounded(Stage::AwaitPacketId, deadline, read_varint(reader)).await?;
    if id != STATUS_RESPONSE_ID {
        return Err(Error::UnexpectedPacketId { got: id });
    }

    let json_length = bounded(Stage::AwaitJsonLength, deadline, read_varint(reader)).await?;
    trace!(json_length, "got status JSON length");

    let json = bounded(
        Stage::AwaitJsonBytes,
        deadline,
        read_exact_len(reader, json_length),
    )
    .await?;
    Ok(String::from_utf8(json)?)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::{frame::frame, varint};

    const DEADLINE: Duration = Duration::from_secs(5);

    fn response(json: &str) -> Vec<u8> {
        let mut body = vec![0x00];
        varint::write(&mut body, json.len() as u32);
        body.extend_from_slice(json.as_bytes());
        frame(&body)
    }

    #[tokio::test]
    async fn reads_json_payload() {
        let json = r#"{"description":"hi"}"#;
        let bytes = response(json);
        let mut stream = bytes.as_slice();
        assert_eq!(read_status(&mut stream, DEADLINE).await.unwrap(), json);
        assert!(stream.is_empty());
    }

    #[tokio::test]
    async fn rejects_other_packet_ids() {
        let mut stream: &[u8] = &[0x03, 0x01, 0x01, b'x'];
        assert!(matches!(
            read_status(&mut stream, DEADLINE).await,
            Err(Error::UnexpectedPacketId { got: 1 })
        ));
    }

    #[tokio::test]
    async fn truncated_json_is_connection_closed() {
        let mut bytes = response(r#"{"version":{"name":"1.8"}}"#);
        bytes.truncate(bytes.len() - 4);
        let mut stream = bytes.as_slice();
        assert!(matches!(
            read_status(&mut stream, DEADLINE).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn closed_before_anything_arrives() {
        let mut stream: &[u8] = &[];
        assert!(matches!(
            read_status(&mut stream, DEADLINE).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn invalid_utf8() {
        let mut stream: &[u8] = &[0x04, 0x00, 0x02, 0xC3, 0x28];
        assert!(matches!(
            read_status(&mut stream, DEADLINE).await,
            Err(Error::InvalidUtf8(_))
        ));
    }

    #[tokio::test]
    async fn silent_peer_times_out_in_the_stage_it_stalls() {
        let (mut client, mut server) = tokio::io::duplex(64);
        server.write_all(&[0x10, 0x00]).await.unwrap();
        let result = read_status(&mut client, Duration::from_millis(50)).await;
        assert!(matches!(
            result,
            Err(Error::Timeout(Stage::AwaitJsonLength))
        ));
        drop(server);
    }
}
