//! Async lazy stream wrapper.

use std::future::Future;
use std::io;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use wire::error::NegotiationError;

use crate::dialer::select_proto_or_fail_async;

/// Async byte stream that negotiates its protocol on first use.
///
/// The async twin of [`crate::LazyStream`]: the first `poll_read`,
/// `poll_write`, `poll_flush`, or `poll_shutdown` starts the initiator-side
/// negotiation for the pre-chosen protocol, and every poll path funnels
/// through the same in-flight handshake future, so concurrent read and
/// write attempts drive exactly one handshake. Once settled the wrapper is
/// a pure pass-through on success or a stored-error surface on failure.
pub struct LazyStream<S> {
    state: State<S>,
}

enum State<S> {
    /// No handshake byte has been sent yet.
    NotYet { protocol: String, stream: S },
    /// The in-flight handshake; it owns the stream and returns it.
    Handshaking(Pin<Box<dyn Future<Output = Result<S, NegotiationError>> + Send>>),
    /// Handshake succeeded; polls pass through.
    Ready(S),
    /// Handshake failed; polls surface the stored error.
    Failed(NegotiationError),
}

impl<S> std::fmt::Debug for LazyStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &self.state {
            State::NotYet { protocol, .. } => format!("NotYet({protocol})"),
            State::Handshaking(_) => "Handshaking".to_string(),
            State::Ready(_) => "Ready".to_string(),
            State::Failed(error) => format!("Failed({error})"),
        };
        f.debug_struct("LazyStream").field("state", &state).finish()
    }
}

impl<S> LazyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps `stream`, deferring the negotiation of `protocol` until the
    /// first poll.
    pub fn select(stream: S, protocol: impl Into<String>) -> Self {
        Self {
            state: State::NotYet {
                protocol: protocol.into(),
                stream,
            },
        }
    }

    /// Whether the handshake has completed successfully.
    #[must_use]
    pub fn negotiated(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Returns the wrapped stream, unless the handshake is in flight or
    /// has failed.
    pub fn into_inner(self) -> Option<S> {
        match self.state {
            State::NotYet { stream, .. } | State::Ready(stream) => Some(stream),
            State::Handshaking(_) | State::Failed(_) => None,
        }
    }

    /// Drives the handshake until the stream is usable.
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        loop {
            match &mut self.state {
                State::Ready(_) => return Poll::Ready(Ok(())),
                State::Failed(error) => {
                    return Poll::Ready(Err(io::Error::new(
                        error.io_error_kind(),
                        error.to_string(),
                    )));
                }
                State::Handshaking(handshake) => match handshake.as_mut().poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Ok(stream)) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!("lazy handshake complete");
                        self.state = State::Ready(stream);
                    }
                    Poll::Ready(Err(error)) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(%error, "lazy handshake failed");
                        self.state = State::Failed(error);
                    }
                },
                State::NotYet { .. } => {
                    let State::NotYet { protocol, stream } = mem::replace(
                        &mut self.state,
                        State::Failed(NegotiationError::Cancelled),
                    ) else {
                        unreachable!("state was just matched as NotYet");
                    };
                    self.state = State::Handshaking(Box::pin(negotiate_selected(stream, protocol)));
                }
            }
        }
    }
}

/// Initiator-side negotiation that owns the stream for its duration.
async fn negotiate_selected<S>(mut stream: S, protocol: String) -> Result<S, NegotiationError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    select_proto_or_fail_async(&protocol, &mut stream).await?;
    Ok(stream)
}

impl<S> AsyncRead for LazyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_ready(cx))?;
        let State::Ready(stream) = &mut this.state else {
            unreachable!("poll_ready settled the state");
        };
        Pin::new(stream).poll_read(cx, buf)
    }
}

impl<S> AsyncWrite for LazyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_ready(cx))?;
        let State::Ready(stream) = &mut this.state else {
            unreachable!("poll_ready settled the state");
        };
        Pin::new(stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_ready(cx))?;
        let State::Ready(stream) = &mut this.state else {
            unreachable!("poll_ready settled the state");
        };
        Pin::new(stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        ready!(this.poll_ready(cx))?;
        let State::Ready(stream) = &mut this.state else {
            unreachable!("poll_ready settled the state");
        };
        Pin::new(stream).poll_shutdown(cx)
    }
}
