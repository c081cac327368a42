//! Length-prefixed, newline-terminated token framing.
//!
//! One frame is `varint(L)` followed by `L` payload bytes whose final byte
//! is [`DELIMITER`]; the token string is the UTF-8 decoding of the first
//! `L - 1` bytes. `L == 0` decodes to the empty string. Writers assemble the
//! whole frame in memory and emit it as one write followed by a flush so the
//! length prefix and payload can never be split across application writes.

use std::io::{self, Read, Write};

use crate::error::NegotiationError;
use crate::short_read::read_exact_retrying;
use crate::varint::{decode_varint, encode_varint_to_vec, read_varint_or_eof};
use crate::{DELIMITER, MAX_TOKEN_PAYLOAD, TOO_LARGE_MSG};

/// Appends one complete token frame for `payload` to `dst`.
///
/// Fails when the payload contains an interior delimiter byte or would
/// declare a frame longer than [`MAX_TOKEN_PAYLOAD`].
pub fn encode_token_to_vec(payload: &[u8], dst: &mut Vec<u8>) -> Result<(), NegotiationError> {
    validate_payload(payload)?;
    encode_varint_to_vec(payload.len() as u64 + 1, dst);
    dst.extend_from_slice(payload);
    dst.push(DELIMITER);
    Ok(())
}

/// Writes one token frame as a single write followed by a flush.
pub fn write_token<W: Write>(stream: &mut W, payload: &[u8]) -> Result<(), NegotiationError> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    encode_token_to_vec(payload, &mut frame)?;
    stream.write_all(&frame)?;
    stream.flush()?;
    Ok(())
}

/// Reads one token, treating any end-of-stream as an error.
///
/// The stream must also be writable because an oversized declared length is
/// answered with a best-effort [`TOO_LARGE_MSG`] token before failing.
pub fn read_token<S: Read + Write>(stream: &mut S) -> Result<String, NegotiationError> {
    match read_token_or_eof(stream)? {
        Some(token) => Ok(token),
        None => Err(NegotiationError::TransportClosed),
    }
}

/// Reads one token, reporting a clean end-of-stream as `None`.
///
/// The three outcomes the wire cannot distinguish by sentinel alone are kept
/// apart here: `Some("")` is an empty token, `None` is end-of-stream at a
/// token boundary, and a stream that ends inside a frame fails with
/// [`NegotiationError::TransportClosed`].
pub fn read_token_or_eof<S: Read + Write>(
    stream: &mut S,
) -> Result<Option<String>, NegotiationError> {
    let declared = match read_varint_or_eof(stream).map_err(map_framing_error)? {
        Some(declared) => declared,
        None => return Ok(None),
    };

    if declared == 0 {
        return Ok(Some(String::new()));
    }
    if declared > MAX_TOKEN_PAYLOAD {
        // Tell the peer why the stream is about to die; its failure is
        // secondary to the one being reported.
        let _ = write_token(stream, TOO_LARGE_MSG.as_bytes());
        return Err(NegotiationError::MessageTooLarge { declared });
    }

    let mut payload = vec![0u8; declared as usize];
    read_exact_retrying(stream, &mut payload).map_err(map_framing_error)?;

    Ok(Some(token_from_payload(&payload)?))
}

/// Decodes one token frame from the front of `input`.
///
/// Returns the token together with the unread remainder of the slice. Used
/// by the `ls` listing parser, which receives a fully buffered envelope.
pub fn decode_token(input: &[u8]) -> Result<(String, &[u8]), NegotiationError> {
    let (declared, rest) = decode_varint(input).map_err(map_framing_error)?;
    if declared == 0 {
        return Ok((String::new(), rest));
    }
    if declared > MAX_TOKEN_PAYLOAD {
        return Err(NegotiationError::MessageTooLarge { declared });
    }

    let len = declared as usize;
    if rest.len() < len {
        return Err(NegotiationError::TransportClosed);
    }
    let (payload, rest) = rest.split_at(len);
    Ok((token_from_payload(payload)?, rest))
}

/// Validates the trailing delimiter and decodes the token string.
pub(crate) fn token_from_payload(payload: &[u8]) -> Result<String, NegotiationError> {
    let (&last, body) = payload
        .split_last()
        .expect("payload is non-empty for declared lengths above zero");
    if last != DELIMITER {
        return Err(NegotiationError::MissingDelimiter);
    }
    if memchr::memchr(DELIMITER, body).is_some() {
        return Err(NegotiationError::BadEncoding);
    }
    match std::str::from_utf8(body) {
        Ok(token) => Ok(token.to_string()),
        Err(_) => Err(NegotiationError::BadEncoding),
    }
}

/// Rejects payloads this codec would itself refuse to read back.
fn validate_payload(payload: &[u8]) -> Result<(), NegotiationError> {
    if payload.len() as u64 + 1 > MAX_TOKEN_PAYLOAD {
        return Err(NegotiationError::MessageTooLarge {
            declared: payload.len() as u64 + 1,
        });
    }
    if memchr::memchr(DELIMITER, payload).is_some() {
        return Err(NegotiationError::BadEncoding);
    }
    Ok(())
}

/// Maps codec-level `io` failures onto the negotiation taxonomy.
pub(crate) fn map_framing_error(error: io::Error) -> NegotiationError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        NegotiationError::TransportClosed
    } else {
        NegotiationError::Io(error)
    }
}
