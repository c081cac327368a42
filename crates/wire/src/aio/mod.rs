//! Async twin of the blocking codec and wire exchanges.
//!
//! Semantics are byte-for-byte identical to the blocking surface; only the
//! suspension model differs. Every read and write below is a suspension
//! point, so callers cancel an operation by dropping its future (or through
//! the muxer crate's cancellation-token variants). The blocking codec's
//! short-read retry sleep has no equivalent here: the runtime parks the task
//! until the source is ready.

mod exchange;
mod token;
mod varint;

pub use self::exchange::{
    handshake_as_initiator, handshake_as_listener, read_ls, try_select, write_ls,
};
pub use self::token::{read_token, read_token_or_eof, write_token};
pub use self::varint::{read_varint, read_varint_or_eof, write_varint};
