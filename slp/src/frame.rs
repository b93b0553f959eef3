//! Length-prefixed packet framing.
//!
//! Every packet on the wire is `VarInt(length) ++ body`, where `body` starts
//! with the packet ID.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Error, varint};

/// Prefixes `body` with its length.
#[must_use]
pub fn frame(body: &[u8]) -> Vec<u8> {
    #[allow(clippy::cast_possible_truncation)]
    let len = body.len() as u32;
    let mut out = Vec::with_capacity(varint::encoded_len(len) + body.len());
    varint::write(&mut out, len);
    out.extend_from_slice(body);
    out
}

/// Reads one framed packet and returns its body (packet ID included).
///
/// # Errors
/// [`Error::ConnectionClosed`] if the stream ends before the declared number
/// of bytes arrived, or any error from [`varint::read_varint`].
pub async fn read_framed<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let len = varint::read_varint(reader).await?;
    read_exact_len(reader, len).await
}

/// Reads exactly `len` bytes, looping over short reads.
///
/// The buffer only grows as bytes arrive, so a bogus length cannot make us
/// allocate it up front.
pub(crate) async fn read_exact_len<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: u32,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    reader.take(u64::from(len)).read_to_end(&mut body).await?;
    if body.len() < len as usize {
        trace!(expected = len, got = body.len(), "stream closed inside a frame");
        return Err(Error::ConnectionClosed);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[test]
    fn frames_body() {
        assert_eq!(frame(&[0x00]), [0x01, 0x00]);
        assert_eq!(frame(&[]), [0x00]);

        let body = vec![0xAA; 200];
        let framed = frame(&body);
        assert_eq!(&framed[..2], [0xC8, 0x01]);
        assert_eq!(&framed[2..], body.as_slice());
    }

    #[tokio::test]
    async fn reads_framed_packet() {
        let mut stream: &[u8] = &[0x03, 0x00, 0x01, 0x02, 0xFF];
        assert_eq!(read_framed(&mut stream).await.unwrap(), [0x00, 0x01, 0x02]);
        assert_eq!(stream, [0xFF]);
    }

    #[tokio::test]
    async fn reassembles_partial_reads() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            server.write_all(&[0x04, 0x00]).await.unwrap();
            tokio::task::yield_now().await;
            server.write_all(&[0x61]).await.unwrap();
            tokio::task::yield_now().await;
            server.write_all(&[0x62, 0x63]).await.unwrap();
        });
        let body = read_framed(&mut client).await.unwrap();
        assert_eq!(body, [0x00, 0x61, 0x62, 0x63]);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn closed_before_declared_length() {
        let mut stream: &[u8] = &[0x05, 0x00, 0x01];
        assert!(matches!(
            read_framed(&mut stream).await,
            Err(Error::ConnectionClosed)
        ));
    }
}
