#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `test-support` holds the stream fixtures shared by the workspace test
//! suites: a scripted [`MemoryTransport`] for single-ended codec tests and a
//! blocking [`DuplexPipe`] so end-to-end negotiations can run listener and
//! initiator on two threads. The async suites use `tokio::io::duplex`
//! instead, so everything here is std-only.

mod duplex;
mod memory;

pub use crate::duplex::DuplexPipe;
pub use crate::memory::MemoryTransport;
