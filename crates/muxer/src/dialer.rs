//! Initiator-side selection helpers.
//!
//! Candidates are proposed strictly in caller order, one request/response
//! pair at a time; the first acceptance wins and no later candidate is
//! attempted. The candidate sequence is never reordered.

use std::io::{Read, Write};

use wire::error::NegotiationError;
use wire::{Selection, handshake_as_initiator, try_select};

#[cfg(feature = "async")]
use tokio::io::{AsyncRead, AsyncWrite};
#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

#[cfg(feature = "async")]
use crate::cancel::with_cancellation;

/// Negotiates exactly `protocol`, failing when the peer does not support it.
pub fn select_proto_or_fail<S: Read + Write>(
    protocol: &str,
    stream: &mut S,
) -> Result<(), NegotiationError> {
    handshake_as_initiator(stream)?;
    match try_select(stream, protocol)? {
        Selection::Selected => Ok(()),
        Selection::NotSupported => Err(not_supported(&[protocol])),
    }
}

/// Negotiates the first of `protocols` the peer accepts.
///
/// Fails with [`NegotiationError::ProtocolNotSupported`] naming every
/// attempted candidate when the peer rejects them all.
pub fn select_one_of<S: Read + Write>(
    protocols: &[&str],
    stream: &mut S,
) -> Result<String, NegotiationError> {
    handshake_as_initiator(stream)?;
    for protocol in protocols {
        match try_select(stream, protocol)? {
            Selection::Selected => return Ok((*protocol).to_string()),
            Selection::NotSupported => {}
        }
    }
    Err(not_supported(protocols))
}

/// Async variant of [`select_proto_or_fail`].
#[cfg(feature = "async")]
pub async fn select_proto_or_fail_async<S: AsyncRead + AsyncWrite + Unpin>(
    protocol: &str,
    stream: &mut S,
) -> Result<(), NegotiationError> {
    wire::aio::handshake_as_initiator(stream).await?;
    match wire::aio::try_select(stream, protocol).await? {
        Selection::Selected => Ok(()),
        Selection::NotSupported => Err(not_supported(&[protocol])),
    }
}

/// Async variant of [`select_one_of`].
#[cfg(feature = "async")]
pub async fn select_one_of_async<S: AsyncRead + AsyncWrite + Unpin>(
    protocols: &[&str],
    stream: &mut S,
) -> Result<String, NegotiationError> {
    wire::aio::handshake_as_initiator(stream).await?;
    for protocol in protocols {
        match wire::aio::try_select(stream, protocol).await? {
            Selection::Selected => return Ok((*protocol).to_string()),
            Selection::NotSupported => {}
        }
    }
    Err(not_supported(protocols))
}

/// [`select_proto_or_fail_async`] that aborts with
/// [`NegotiationError::Cancelled`] once `cancel` fires.
#[cfg(feature = "async")]
pub async fn select_proto_or_fail_with_cancel<S: AsyncRead + AsyncWrite + Unpin>(
    protocol: &str,
    stream: &mut S,
    cancel: &CancellationToken,
) -> Result<(), NegotiationError> {
    with_cancellation(cancel, select_proto_or_fail_async(protocol, stream)).await
}

/// [`select_one_of_async`] that aborts with
/// [`NegotiationError::Cancelled`] once `cancel` fires.
#[cfg(feature = "async")]
pub async fn select_one_of_with_cancel<S: AsyncRead + AsyncWrite + Unpin>(
    protocols: &[&str],
    stream: &mut S,
    cancel: &CancellationToken,
) -> Result<String, NegotiationError> {
    with_cancellation(cancel, select_one_of_async(protocols, stream)).await
}

fn not_supported(attempted: &[&str]) -> NegotiationError {
    NegotiationError::ProtocolNotSupported {
        attempted: attempted.iter().map(|p| (*p).to_string()).collect(),
    }
}
