//! Handshake, selection, and listing exchanges over the token codec.
//!
//! The listener speaks first: it announces [`PROTOCOL_ID`] before reading
//! anything, so a freshly connected initiator learns the listener's version
//! before replying. Selection request/response pairs are strictly
//! interleaved; a new proposal is only written after the previous reply has
//! been read.

use std::io::{Read, Write};

use crate::error::NegotiationError;
use crate::short_read::read_exact_retrying;
use crate::token::{
    decode_token, encode_token_to_vec, map_framing_error, read_token, read_token_or_eof,
    write_token,
};
use crate::varint::{decode_varint, encode_varint_to_vec, read_varint};
use crate::{NA_TOKEN, PROTOCOL_ID};

/// Outcome of proposing one protocol to the peer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Selection {
    /// The peer echoed the proposal back.
    Selected,
    /// The peer answered `na` or hung up at a token boundary.
    NotSupported,
}

/// Runs the version exchange from the initiator side.
///
/// The initiator reads the listener's announcement first and only then
/// writes its own, failing with [`NegotiationError::VersionMismatch`] when
/// the announcement is not [`PROTOCOL_ID`].
pub fn handshake_as_initiator<S: Read + Write>(stream: &mut S) -> Result<(), NegotiationError> {
    let announced = read_token(stream)?;
    if announced != PROTOCOL_ID {
        return Err(NegotiationError::VersionMismatch { token: announced });
    }
    write_token(stream, PROTOCOL_ID.as_bytes())?;

    #[cfg(feature = "tracing")]
    tracing::trace!("initiator handshake complete");

    Ok(())
}

/// Runs the version exchange from the listener side.
///
/// The listener announces [`PROTOCOL_ID`] before reading the peer's reply.
/// On mismatch the stream is unusable and the caller is expected to drop it.
pub fn handshake_as_listener<S: Read + Write>(stream: &mut S) -> Result<(), NegotiationError> {
    write_token(stream, PROTOCOL_ID.as_bytes())?;
    let announced = read_token(stream)?;
    if announced != PROTOCOL_ID {
        return Err(NegotiationError::VersionMismatch { token: announced });
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("listener handshake complete");

    Ok(())
}

/// Proposes `protocol` and classifies the peer's reply.
///
/// An echo of the proposal is [`Selection::Selected`]; `na` or a clean
/// end-of-stream is [`Selection::NotSupported`]; any other reply fails with
/// [`NegotiationError::UnexpectedToken`].
pub fn try_select<S: Read + Write>(
    stream: &mut S,
    protocol: &str,
) -> Result<Selection, NegotiationError> {
    write_token(stream, protocol.as_bytes())?;
    let Some(reply) = read_token_or_eof(stream)? else {
        return Ok(Selection::NotSupported);
    };
    classify_selection_reply(protocol, &reply)
}

/// Shared reply classification for the blocking and async `try_select`.
pub(crate) fn classify_selection_reply(
    protocol: &str,
    reply: &str,
) -> Result<Selection, NegotiationError> {
    if reply == protocol {
        #[cfg(feature = "tracing")]
        tracing::debug!(protocol, "peer accepted protocol");
        return Ok(Selection::Selected);
    }
    if reply == NA_TOKEN || reply.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::debug!(protocol, "peer rejected protocol");
        return Ok(Selection::NotSupported);
    }
    Err(NegotiationError::UnexpectedToken {
        token: reply.to_string(),
    })
}

/// Builds the `ls` listing envelope for `protocols`.
///
/// The inner buffer is `varint(N)` followed by one full token per protocol;
/// the outer buffer prefixes the inner bytes with their length so a reader
/// can skip the listing without parsing tokens.
pub(crate) fn encode_ls(protocols: &[String]) -> Result<Vec<u8>, NegotiationError> {
    let mut inner = Vec::new();
    encode_varint_to_vec(protocols.len() as u64, &mut inner);
    for protocol in protocols {
        encode_token_to_vec(protocol.as_bytes(), &mut inner)?;
    }

    let mut outer = Vec::with_capacity(inner.len() + 3);
    encode_varint_to_vec(inner.len() as u64, &mut outer);
    outer.extend_from_slice(&inner);
    Ok(outer)
}

/// Writes the `ls` listing for `protocols` as one write followed by a flush.
pub fn write_ls<S: Write>(stream: &mut S, protocols: &[String]) -> Result<(), NegotiationError> {
    let envelope = encode_ls(protocols)?;
    stream.write_all(&envelope)?;
    stream.flush()?;

    #[cfg(feature = "tracing")]
    tracing::debug!(count = protocols.len(), "served protocol listing");

    Ok(())
}

/// Reads and parses an `ls` listing envelope.
///
/// Validates that the outer length covers exactly the inner listing and
/// that the listing holds exactly the announced number of tokens.
pub fn read_ls<S: Read>(stream: &mut S) -> Result<Vec<String>, NegotiationError> {
    let outer_len = read_varint(stream).map_err(map_framing_error)?;
    let mut inner = vec![0u8; checked_envelope_len(outer_len)?];
    read_exact_retrying(stream, &mut inner).map_err(map_framing_error)?;
    decode_ls(&inner)
}

/// Bounds an `ls` envelope the same way a single token is bounded.
pub(crate) fn checked_envelope_len(declared: u64) -> Result<usize, NegotiationError> {
    if declared > crate::MAX_TOKEN_PAYLOAD {
        return Err(NegotiationError::MessageTooLarge { declared });
    }
    Ok(declared as usize)
}

/// Parses the inner bytes of an `ls` envelope.
pub(crate) fn decode_ls(inner: &[u8]) -> Result<Vec<String>, NegotiationError> {
    let (count, mut rest) = decode_varint(inner).map_err(|_| envelope_error())?;
    let mut protocols = Vec::with_capacity(usize::try_from(count).map_err(|_| envelope_error())?);
    for _ in 0..count {
        let (protocol, remainder) = decode_token(rest)?;
        protocols.push(protocol);
        rest = remainder;
    }
    if !rest.is_empty() {
        return Err(envelope_error());
    }
    Ok(protocols)
}

fn envelope_error() -> NegotiationError {
    NegotiationError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "malformed ls listing envelope",
    ))
}
