//! Async varint reads and writes.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::varint::encode_varint_to_vec;

/// Writes the varint encoding of `value` to `writer`.
pub async fn write_varint<W: AsyncWrite + Unpin>(writer: &mut W, value: u64) -> io::Result<()> {
    let mut encoded = Vec::with_capacity(10);
    encode_varint_to_vec(value, &mut encoded);
    writer.write_all(&encoded).await
}

/// Reads one varint from `reader`, treating any end-of-stream as an error.
pub async fn read_varint<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<u64> {
    match read_varint_or_eof(reader).await? {
        Some(value) => Ok(value),
        None => Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "varint truncated",
        )),
    }
}

/// Reads one varint, reporting a clean end-of-stream as `None`.
///
/// As in the blocking codec, `None` is only returned when the stream ends
/// before the first varint byte.
pub async fn read_varint_or_eof<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> io::Result<Option<u64>> {
    let Some(first) = read_byte_or_eof(reader).await? else {
        return Ok(None);
    };

    let mut value = u64::from(first & 0x7f);
    let mut index = 0usize;
    let mut byte = first;
    while byte & 0x80 != 0 {
        index += 1;
        if index >= 10 {
            return Err(overflow_error());
        }
        byte = reader.read_u8().await.map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                io::Error::new(io::ErrorKind::UnexpectedEof, "varint truncated")
            } else {
                error
            }
        })?;
        if index == 9 && byte > 0x01 {
            return Err(overflow_error());
        }
        value |= u64::from(byte & 0x7f) << (7 * index as u32);
    }
    Ok(Some(value))
}

/// Reads a single byte, reporting end-of-stream as `None`.
async fn read_byte_or_eof<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    if reader.read(&mut byte).await? == 0 {
        return Ok(None);
    }
    Ok(Some(byte[0]))
}

fn overflow_error() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, "varint overflows a u64")
}
