//! Async token framing with the blocking codec's exact wire semantics.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::aio::varint::read_varint_or_eof;
use crate::error::NegotiationError;
use crate::token::{encode_token_to_vec, map_framing_error, token_from_payload};
use crate::{MAX_TOKEN_PAYLOAD, TOO_LARGE_MSG};

/// Writes one token frame as a single write followed by a flush.
pub async fn write_token<W: AsyncWrite + Unpin>(
    stream: &mut W,
    payload: &[u8],
) -> Result<(), NegotiationError> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    encode_token_to_vec(payload, &mut frame)?;
    stream.write_all(&frame).await.map_err(NegotiationError::Io)?;
    stream.flush().await.map_err(NegotiationError::Io)?;
    Ok(())
}

/// Reads one token, treating any end-of-stream as an error.
pub async fn read_token<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
) -> Result<String, NegotiationError> {
    match read_token_or_eof(stream).await? {
        Some(token) => Ok(token),
        None => Err(NegotiationError::TransportClosed),
    }
}

/// Reads one token, reporting a clean end-of-stream as `None`.
///
/// Mirrors the blocking [`crate::token::read_token_or_eof`]: `Some("")` is
/// an empty token, `None` a token-boundary end-of-stream, and a truncated
/// frame fails with [`NegotiationError::TransportClosed`]. An oversized
/// declared length is answered with a best-effort [`TOO_LARGE_MSG`] token
/// before failing.
pub async fn read_token_or_eof<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
) -> Result<Option<String>, NegotiationError> {
    let declared = match read_varint_or_eof(stream).await.map_err(map_framing_error)? {
        Some(declared) => declared,
        None => return Ok(None),
    };

    if declared == 0 {
        return Ok(Some(String::new()));
    }
    if declared > MAX_TOKEN_PAYLOAD {
        let _ = write_token(stream, TOO_LARGE_MSG.as_bytes()).await;
        return Err(NegotiationError::MessageTooLarge { declared });
    }

    let mut payload = vec![0u8; declared as usize];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(map_framing_error)?;

    Ok(Some(token_from_payload(&payload)?))
}

/// Reads exactly `len` bytes into a fresh buffer.
pub(crate) async fn read_exact_vec<R: AsyncRead + Unpin>(
    reader: &mut R,
    len: usize,
) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}
