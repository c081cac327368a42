//! Async handshake, selection, and listing exchanges.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::aio::token::{read_exact_vec, read_token, read_token_or_eof, write_token};
use crate::aio::varint::read_varint;
use crate::error::NegotiationError;
use crate::exchange::{Selection, classify_selection_reply, decode_ls, encode_ls};
use crate::token::map_framing_error;
use crate::PROTOCOL_ID;

/// Runs the version exchange from the initiator side.
pub async fn handshake_as_initiator<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
) -> Result<(), NegotiationError> {
    let announced = read_token(stream).await?;
    if announced != PROTOCOL_ID {
        return Err(NegotiationError::VersionMismatch { token: announced });
    }
    write_token(stream, PROTOCOL_ID.as_bytes()).await?;

    #[cfg(feature = "tracing")]
    tracing::trace!("initiator handshake complete");

    Ok(())
}

/// Runs the version exchange from the listener side.
pub async fn handshake_as_listener<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
) -> Result<(), NegotiationError> {
    write_token(stream, PROTOCOL_ID.as_bytes()).await?;
    let announced = read_token(stream).await?;
    if announced != PROTOCOL_ID {
        return Err(NegotiationError::VersionMismatch { token: announced });
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("listener handshake complete");

    Ok(())
}

/// Proposes `protocol` and classifies the peer's reply.
pub async fn try_select<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    protocol: &str,
) -> Result<Selection, NegotiationError> {
    write_token(stream, protocol.as_bytes()).await?;
    let Some(reply) = read_token_or_eof(stream).await? else {
        return Ok(Selection::NotSupported);
    };
    classify_selection_reply(protocol, &reply)
}

/// Writes the `ls` listing for `protocols` as one write followed by a flush.
pub async fn write_ls<S: AsyncWrite + Unpin>(
    stream: &mut S,
    protocols: &[String],
) -> Result<(), NegotiationError> {
    let envelope = encode_ls(protocols)?;
    stream
        .write_all(&envelope)
        .await
        .map_err(NegotiationError::Io)?;
    stream.flush().await.map_err(NegotiationError::Io)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(count = protocols.len(), "served protocol listing");

    Ok(())
}

/// Reads and parses an `ls` listing envelope.
pub async fn read_ls<S: AsyncRead + Unpin>(
    stream: &mut S,
) -> Result<Vec<String>, NegotiationError> {
    let outer_len = read_varint(stream).await.map_err(map_framing_error)?;
    let len = crate::exchange::checked_envelope_len(outer_len)?;
    let inner = read_exact_vec(stream, len).await.map_err(map_framing_error)?;
    decode_ls(&inner)
}
