#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `muxer` turns the framing and exchanges of the [`wire`] crate into the
//! two negotiation roles of multistream-select. The listener-side [`Muxer`]
//! owns a registry of protocol [`Handler`]s and awaits a selection; the
//! initiator-side free functions ([`select_proto_or_fail`],
//! [`select_one_of`]) drive the handshake and propose protocols; the
//! [`LazyStream`] wrapper defers the initiator handshake until the first
//! byte crosses the application boundary.
//!
//! # Design
//!
//! - Every operation exists in blocking and (behind the `async` feature)
//!   suspending form with identical wire behaviour. Async variants carry an
//!   `_async` suffix; `_with_cancel` variants additionally race a
//!   `CancellationToken` and fail with [`NegotiationError::Cancelled`].
//! - The [`Registry`] preserves registration order, which is also the order
//!   of the `ls` listing, and re-registration replaces in place.
//! - Handlers are dispatched without holding the registry lock, so a
//!   handler may re-register protocols; such changes affect future
//!   negotiations only.
//!
//! # Examples
//!
//! Negotiate `/echo/1.0.0` between two threads over an in-memory pipe:
//!
//! ```no_run
//! use muxer::{Dispatch, Muxer, select_proto_or_fail};
//! # fn transport_pair() -> (std::io::Cursor<Vec<u8>>, std::io::Cursor<Vec<u8>>) { unimplemented!() }
//!
//! let muxer = Muxer::new();
//! muxer.add_handler_func("/echo/1.0.0", Dispatch::from_sync(|_, _| true));
//!
//! let (mut listener_end, mut initiator_end) = transport_pair();
//! std::thread::scope(|scope| {
//!     let listener = scope.spawn(|| muxer.handle(&mut listener_end));
//!     select_proto_or_fail("/echo/1.0.0", &mut initiator_end).unwrap();
//!     assert!(listener.join().unwrap().unwrap());
//! });
//! ```

#[cfg(feature = "async")]
pub mod aio;
#[cfg(feature = "async")]
mod cancel;
mod dialer;
mod handler;
mod lazy;
mod listener;
mod registry;

pub use crate::dialer::{select_one_of, select_proto_or_fail};
pub use crate::handler::{Dispatch, Handler, Stream, SyncHandlerFn};
pub use crate::lazy::LazyStream;
pub use crate::listener::{Muxer, NegotiationResult};
pub use crate::registry::Registry;

#[cfg(feature = "async")]
pub use crate::dialer::{
    select_one_of_async, select_one_of_with_cancel, select_proto_or_fail_async,
    select_proto_or_fail_with_cancel,
};
#[cfg(feature = "async")]
pub use crate::handler::{AsyncHandlerFn, AsyncStream, HandlerFuture};

pub use wire::error::NegotiationError;
pub use wire::{
    LS_TOKEN, NA_TOKEN, PROTOCOL_ID, Selection, read_token, read_token_or_eof,
};
