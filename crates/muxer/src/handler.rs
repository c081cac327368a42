//! Handler model: what runs once a protocol has been negotiated.
//!
//! A [`Handler`] binds a protocol identifier to a [`Dispatch`] callback set.
//! Callbacks receive the negotiated protocol string and the stream, which by
//! then carries application bytes only; their boolean result is surfaced
//! unchanged by [`crate::Muxer::handle`]. A handler registered with
//! [`Dispatch::Neither`] claims the identifier but reports failure when
//! dispatched, as does a dispatch in a mode the handler has no callback for.

use std::io::{Read, Write};
use std::sync::Arc;

#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

#[cfg(feature = "async")]
use tokio::io::{AsyncRead, AsyncWrite};

/// Object-safe view of a blocking byte stream.
pub trait Stream: Read + Write {}

impl<T: Read + Write + ?Sized> Stream for T {}

/// Object-safe view of a suspending byte stream.
#[cfg(feature = "async")]
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

#[cfg(feature = "async")]
impl<T: AsyncRead + AsyncWrite + Unpin + Send + ?Sized> AsyncStream for T {}

/// Blocking handler callback.
pub type SyncHandlerFn = Arc<dyn Fn(&str, &mut dyn Stream) -> bool + Send + Sync>;

/// Future returned by an async handler callback.
#[cfg(feature = "async")]
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Suspending handler callback.
#[cfg(feature = "async")]
pub type AsyncHandlerFn =
    Arc<dyn for<'a> Fn(&'a str, &'a mut dyn AsyncStream) -> HandlerFuture<'a> + Send + Sync>;

/// Callback set of a handler.
#[derive(Clone)]
pub enum Dispatch {
    /// A blocking callback only.
    Sync(SyncHandlerFn),
    /// A suspending callback only.
    #[cfg(feature = "async")]
    Async(AsyncHandlerFn),
    /// Both callbacks; each dispatch mode uses its own.
    #[cfg(feature = "async")]
    Both(SyncHandlerFn, AsyncHandlerFn),
    /// No callback; dispatch reports failure.
    Neither,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Sync(_) => "Sync",
            #[cfg(feature = "async")]
            Self::Async(_) => "Async",
            #[cfg(feature = "async")]
            Self::Both(..) => "Both",
            Self::Neither => "Neither",
        };
        f.write_str(kind)
    }
}

impl Dispatch {
    /// Wraps a blocking closure.
    pub fn from_sync<F>(callback: F) -> Self
    where
        F: Fn(&str, &mut dyn Stream) -> bool + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(callback))
    }

    /// Wraps a suspending closure.
    #[cfg(feature = "async")]
    pub fn from_async<F>(callback: F) -> Self
    where
        F: for<'a> Fn(&'a str, &'a mut dyn AsyncStream) -> HandlerFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        Self::Async(Arc::new(callback))
    }
}

/// A registered protocol handler.
#[derive(Clone, Debug)]
pub struct Handler {
    protocol: String,
    dispatch: Dispatch,
}

impl Handler {
    /// Binds `dispatch` to `protocol`.
    pub fn new(protocol: impl Into<String>, dispatch: Dispatch) -> Self {
        Self {
            protocol: protocol.into(),
            dispatch,
        }
    }

    /// The protocol identifier this handler answers for.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Runs the blocking callback, or reports failure when there is none.
    pub fn dispatch_sync(&self, protocol: &str, stream: &mut dyn Stream) -> bool {
        match &self.dispatch {
            Dispatch::Sync(callback) => callback(protocol, stream),
            #[cfg(feature = "async")]
            Dispatch::Both(callback, _) => callback(protocol, stream),
            _ => false,
        }
    }

    /// Awaits the suspending callback, or reports failure when there is none.
    #[cfg(feature = "async")]
    pub async fn dispatch_async<'a>(
        &'a self,
        protocol: &'a str,
        stream: &'a mut dyn AsyncStream,
    ) -> bool {
        match &self.dispatch {
            Dispatch::Async(callback) | Dispatch::Both(_, callback) => {
                callback(protocol, stream).await
            }
            _ => false,
        }
    }
}
