//! Blocking lazy stream wrapper.

use std::io::{self, Read, Write};
use std::mem;

use wire::error::NegotiationError;

use crate::dialer::select_proto_or_fail;

/// Byte stream that negotiates its protocol on first use.
///
/// The wrapper exposes the read/write surface of the wrapped stream. The
/// first read, write, or flush runs the initiator-side negotiation for the
/// pre-chosen protocol; on success the triggering operation proceeds and
/// every later operation is a pure pass-through, on failure the triggering
/// and all later operations fail with the stored error. The handshake runs
/// at most once and no application data is buffered by the wrapper.
#[derive(Debug)]
pub struct LazyStream<S> {
    state: State<S>,
}

#[derive(Debug)]
enum State<S> {
    /// No handshake byte has been sent yet.
    NotYet { protocol: String, stream: S },
    /// Placeholder while the handshake owns the stream.
    Handshaking,
    /// Handshake succeeded; operations pass through.
    Ready(S),
    /// Handshake failed; operations surface the stored error.
    Failed(NegotiationError),
}

impl<S: Read + Write> LazyStream<S> {
    /// Wraps `stream`, deferring the negotiation of `protocol` until the
    /// first read or write.
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

    /// Returns the wrapped stream, unless the handshake failed.
    ///
    /// Before the first operation this simply unwraps; after a successful
    /// handshake the stream carries application bytes.
    pub fn into_inner(self) -> Option<S> {
        match self.state {
            State::NotYet { stream, .. } | State::Ready(stream) => Some(stream),
            State::Handshaking | State::Failed(_) => None,
        }
    }

    /// Runs the deferred handshake if it has not run yet.
    fn ensure_ready(&mut self) -> io::Result<&mut S> {
        if let State::NotYet { .. } = self.state {
            let State::NotYet {
                protocol,
                mut stream,
            } = mem::replace(&mut self.state, State::Handshaking)
            else {
                unreachable!("state was just matched as NotYet");
            };

            self.state = match select_proto_or_fail(&protocol, &mut stream) {
                Ok(()) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %protocol, "lazy handshake complete");
                    State::Ready(stream)
                }
                Err(error) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(protocol = %protocol, %error, "lazy handshake failed");
                    State::Failed(error)
                }
            };
        }

        match &mut self.state {
            State::Ready(stream) => Ok(stream),
            State::Failed(error) => Err(io::Error::new(error.io_error_kind(), error.to_string())),
            State::NotYet { .. } | State::Handshaking => {
                unreachable!("handshake was just settled")
            }
        }
    }
}

impl<S: Read + Write> Read for LazyStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_ready()?.read(buf)
    }
}

impl<S: Read + Write> Write for LazyStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ensure_ready()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ensure_ready()?.flush()
    }
}
