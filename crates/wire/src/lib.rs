#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `wire` implements the byte-level layer of the multistream-select
//! negotiation protocol: unsigned varint I/O, the length-prefixed
//! newline-terminated token codec, and the small wire exchanges
//! (version handshake, `try_select`, the `ls` listing envelope) that the
//! `muxer` crate composes into full listener and initiator state machines.
//!
//! # Design
//!
//! - [`varint`] reads and writes unsigned LEB128 integers over `std::io`
//!   streams and byte slices.
//! - [`token`] frames one message as `varint(L)` followed by `L` payload
//!   bytes whose final byte is the newline delimiter. Writers always build
//!   the complete frame in memory and emit it as a single write followed by
//!   a flush, so a frame is never split across application writes.
//! - [`exchange`] layers the handshake, selection, and listing exchanges on
//!   top of the token codec.
//! - [`aio`] (behind the `async` feature) mirrors the blocking surface over
//!   tokio's `AsyncRead`/`AsyncWrite` with identical wire semantics.
//!
//! # Invariants
//!
//! - A declared token length above [`MAX_TOKEN_PAYLOAD`] is rejected after a
//!   best-effort [`TOO_LARGE_MSG`] token is sent back to the peer.
//! - Token payloads are opaque UTF-8; only invalid UTF-8 and interior
//!   newline bytes are rejected.
//! - End-of-stream at a token boundary is reported as an absent token, never
//!   as an error; end-of-stream inside a frame is
//!   [`NegotiationError::TransportClosed`].

pub mod error;
pub mod exchange;
mod short_read;
pub mod token;
pub mod varint;

#[cfg(feature = "async")]
pub mod aio;

pub use crate::error::NegotiationError;
pub use crate::exchange::{
    Selection, handshake_as_initiator, handshake_as_listener, read_ls, try_select, write_ls,
};
pub use crate::token::{
    decode_token, encode_token_to_vec, read_token, read_token_or_eof, write_token,
};
pub use crate::varint::{
    decode_varint, encode_varint_to_vec, read_varint, read_varint_or_eof, write_varint,
};

/// Identifier exchanged by both peers before any selection takes place.
pub const PROTOCOL_ID: &str = "/multistream/1.0.0";

/// Terminator byte of every token payload.
pub const DELIMITER: u8 = b'\n';

/// Reply sent by a listener that does not support the proposed protocol.
pub const NA_TOKEN: &str = "na";

/// Request token asking a listener to enumerate its registered protocols.
pub const LS_TOKEN: &str = "ls";

/// Upper bound on the declared length of a single token frame.
pub const MAX_TOKEN_PAYLOAD: u64 = 65536;

/// Diagnostic token sent back before rejecting an oversized frame.
pub const TOO_LARGE_MSG: &str = "Messages over 64k are not allowed";
