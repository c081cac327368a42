//! Listener-side negotiation: the [`Muxer`].

use std::io::{Read, Write};

use wire::error::NegotiationError;
use wire::{LS_TOKEN, write_ls, write_token};

use crate::handler::{Dispatch, Handler};
use crate::registry::Registry;

#[cfg(feature = "async")]
use tokio::io::{AsyncRead, AsyncWrite};
#[cfg(feature = "async")]
use tokio_util::sync::CancellationToken;

/// Outcome of a successful listener-side negotiation.
///
/// The protocol string always equals an identifier that was registered when
/// the selection was accepted, and `handler` is the handler that was bound
/// to it at that moment.
#[derive(Clone, Debug)]
pub struct NegotiationResult {
    /// The protocol the peer selected.
    pub protocol: String,
    /// The handler registered for that protocol.
    pub handler: Handler,
}

/// Listener-side protocol negotiation multiplexer.
///
/// A muxer owns a [`Registry`] of handlers and negotiates one incoming
/// stream at a time: after the version exchange the peer may probe with
/// `ls` and propose unsupported protocols any number of times; exactly one
/// protocol is ever accepted per stream. All methods take `&self`, so a
/// muxer wrapped in an `Arc` serves many streams concurrently.
#[derive(Debug, Default)]
pub struct Muxer {
    registry: Registry,
}

impl Muxer {
    /// Creates a muxer with an empty handler registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, replacing any handler with the same protocol.
    pub fn add_handler(&self, handler: Handler) {
        self.registry.add(handler);
    }

    /// Registers a handler assembled from a [`Dispatch`] callback set.
    pub fn add_handler_func(&self, protocol: impl Into<String>, dispatch: Dispatch) {
        self.registry.add(Handler::new(protocol, dispatch));
    }

    /// Removes the handler for `protocol`; a missing entry is a no-op.
    pub fn remove_handler(&self, protocol: &str) {
        self.registry.remove(protocol);
    }

    /// The registered protocol identifiers, in registration order.
    #[must_use]
    pub fn protocols(&self) -> Vec<String> {
        self.registry.protocols()
    }

    /// The handler registry backing this muxer.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Negotiates one stream from the listener side.
    ///
    /// Announces the protocol version, then answers the peer's requests:
    /// `ls` is served with the current listing, an unknown protocol with
    /// `na`, and a registered protocol with an echoed acceptance, at which
    /// point the chosen protocol and handler are returned. A peer that
    /// disconnects at a token boundary without selecting yields `Ok(None)`.
    pub fn negotiate<S: Read + Write>(
        &self,
        stream: &mut S,
    ) -> Result<Option<NegotiationResult>, NegotiationError> {
        wire::handshake_as_listener(stream)?;

        loop {
            let Some(token) = wire::read_token_or_eof(stream)? else {
                #[cfg(feature = "tracing")]
                tracing::debug!("peer disconnected without selecting a protocol");
                return Ok(None);
            };

            if token == LS_TOKEN {
                write_ls(stream, &self.registry.protocols())?;
                continue;
            }

            match self.registry.find(&token) {
                Some(handler) => {
                    write_token(stream, token.as_bytes())?;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %token, "accepted protocol selection");

                    return Ok(Some(NegotiationResult {
                        protocol: token,
                        handler,
                    }));
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %token, "rejected unknown protocol");

                    write_token(stream, wire::NA_TOKEN.as_bytes())?;
                }
            }
        }
    }

    /// Negotiates the stream and dispatches the chosen handler.
    ///
    /// Returns the handler's boolean unchanged, or `false` when the peer
    /// disconnected without selecting.
    pub fn handle<S: Read + Write>(&self, stream: &mut S) -> Result<bool, NegotiationError> {
        match self.negotiate(&mut *stream)? {
            Some(result) => Ok(result.handler.dispatch_sync(&result.protocol, stream)),
            None => Ok(false),
        }
    }

    /// Writes the current protocol listing to `stream`.
    pub fn ls<S: Write>(&self, stream: &mut S) -> Result<(), NegotiationError> {
        write_ls(stream, &self.registry.protocols())
    }
}

#[cfg(feature = "async")]
impl Muxer {
    /// Async variant of [`Muxer::negotiate`].
    pub async fn negotiate_async<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        stream: &mut S,
    ) -> Result<Option<NegotiationResult>, NegotiationError> {
        wire::aio::handshake_as_listener(stream).await?;

        loop {
            let Some(token) = wire::aio::read_token_or_eof(stream).await? else {
                #[cfg(feature = "tracing")]
                tracing::debug!("peer disconnected without selecting a protocol");
                return Ok(None);
            };

            if token == LS_TOKEN {
                wire::aio::write_ls(stream, &self.registry.protocols()).await?;
                continue;
            }

            match self.registry.find(&token) {
                Some(handler) => {
                    wire::aio::write_token(stream, token.as_bytes()).await?;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %token, "accepted protocol selection");

                    return Ok(Some(NegotiationResult {
                        protocol: token,
                        handler,
                    }));
                }
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %token, "rejected unknown protocol");

                    wire::aio::write_token(stream, wire::NA_TOKEN.as_bytes()).await?;
                }
            }
        }
    }

    /// [`Muxer::negotiate_async`] that aborts with
    /// [`NegotiationError::Cancelled`] once `cancel` fires. The stream is in
    /// an undefined protocol state afterwards and must not be reused.
    pub async fn negotiate_with_cancel<S: AsyncRead + AsyncWrite + Unpin>(
        &self,
        stream: &mut S,
        cancel: &CancellationToken,
    ) -> Result<Option<NegotiationResult>, NegotiationError> {
        crate::cancel::with_cancellation(cancel, self.negotiate_async(stream)).await
    }

    /// Async variant of [`Muxer::handle`].
    pub async fn handle_async<S: AsyncRead + AsyncWrite + Unpin + Send>(
        &self,
        stream: &mut S,
    ) -> Result<bool, NegotiationError> {
        match self.negotiate_async(&mut *stream).await? {
            Some(result) => Ok(result.handler.dispatch_async(&result.protocol, stream).await),
            None => Ok(false),
        }
    }

    /// [`Muxer::handle_async`] that aborts with
    /// [`NegotiationError::Cancelled`] once `cancel` fires, including during
    /// handler dispatch.
    pub async fn handle_with_cancel<S: AsyncRead + AsyncWrite + Unpin + Send>(
        &self,
        stream: &mut S,
        cancel: &CancellationToken,
    ) -> Result<bool, NegotiationError> {
        crate::cancel::with_cancellation(cancel, self.handle_async(stream)).await
    }

    /// Async variant of [`Muxer::ls`].
    pub async fn ls_async<S: AsyncWrite + Unpin>(
        &self,
        stream: &mut S,
    ) -> Result<(), NegotiationError> {
        wire::aio::write_ls(stream, &self.registry.protocols()).await
    }
}
