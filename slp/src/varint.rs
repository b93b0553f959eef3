//! The protocol's unsigned VarInt: 7 data bits per byte, least significant
//! group first, with `0x80` set on every byte except the last.
//! [VarInt and VarLong](https://wiki.vg/Protocol#VarInt_and_VarLong)

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::Error;

/// A VarInt never occupies more than this many bytes on the wire.
pub const MAX_LEN: usize = 5;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// Appends the encoding of `value` to `out`.
pub fn write(out: &mut Vec<u8>, mut value: u32) {
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let byte = (value as u8) & SEGMENT_BITS;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | CONTINUE_BIT);
    }
}

/// Encodes `value` into a fresh buffer.
#[must_use]
pub fn encode(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(value));
    write(&mut out, value);
    out
}

/// The number of bytes [`encode`] produces for `value`.
#[must_use]
pub const fn encoded_len(mut value: u32) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Incremental VarInt decoder, fed one byte at a time.
///
/// Both the slice decoder and the stream decoder go through this, so the
/// five byte limit is enforced in one place.
#[derive(Debug, Default, Clone, Copy)]
pub struct VarIntDecoder {
    value: u32,
    read: usize,
}

impl VarIntDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self { value: 0, read: 0 }
    }

    /// Feeds the next byte. Returns the decoded value once a byte without the
    /// continuation bit is seen.
    ///
    /// # Errors
    /// [`Error::VarintTooLong`] if the fifth byte still carries the
    /// continuation bit.
    pub fn push(&mut self, byte: u8) -> Result<Option<u32>, Error> {
        self.value |= u32::from(byte & SEGMENT_BITS) << (7 * self.read);
        self.read += 1;
        if byte & CONTINUE_BIT == 0 {
            return Ok(Some(self.value));
        }
        if self.read == MAX_LEN {
            return Err(Error::VarintTooLong);
        }
        Ok(None)
    }

    /// Whether any byte has been consumed yet.
    #[must_use]
    pub const fn started(&self) -> bool {
        self.read > 0
    }
}

/// Decodes a VarInt from a byte source, pulling bytes until one terminates it.
///
/// # Errors
/// [`Error::TruncatedStream`] if `read_byte` runs dry before the terminating
/// byte, [`Error::VarintTooLong`] if a sixth byte would be needed.
pub fn decode(mut read_byte: impl FnMut() -> Option<u8>) -> Result<u32, Error> {
    let mut decoder = VarIntDecoder::new();
    loop {
        let byte = read_byte().ok_or(Error::TruncatedStream)?;
        if let Some(value) = decoder.push(byte)? {
            return Ok(value);
        }
    }
}

/// Decodes a VarInt from the front of `input`, advancing it past the bytes
/// consumed.
///
/// # Errors
/// See [`decode`].
pub fn decode_slice(input: &mut &[u8]) -> Result<u32, Error> {
    let mut bytes = input.iter();
    let value = decode(|| bytes.next().copied())?;
    *input = bytes.as_slice();
    Ok(value)
}

/// Reads a VarInt off an async stream.
///
/// # Errors
/// [`Error::ConnectionClosed`] if the stream ends before the first byte,
/// [`Error::TruncatedStream`] if it ends part way through, and
/// [`Error::VarintTooLong`] as in [`decode`].
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> Result<u32, Error> {
    let mut decoder = VarIntDecoder::new();
    loop {
        let byte = match reader.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof && decoder.started() => {
                return Err(Error::TruncatedStream);
            }
            Err(e) => return Err(e.into()),
        };
        if let Some(value) = decoder.push(byte)? {
            return Ok(value);
        }
    }
}
