//! Scripted single-ended transport for codec tests.

use std::io::{self, Cursor, Read, Write};

/// In-memory transport that reads from a scripted input and records writes.
#[derive(Clone, Debug)]
pub struct MemoryTransport {
    reader: Cursor<Vec<u8>>,
    writes: Vec<u8>,
    flushes: usize,
}

impl MemoryTransport {
    /// Creates a transport whose read side yields `input` then EOF.
    #[must_use]
    pub fn new(input: &[u8]) -> Self {
        Self {
            reader: Cursor::new(input.to_vec()),
            writes: Vec::new(),
            flushes: 0,
        }
    }

    /// All bytes written so far, in order.
    #[must_use]
    pub fn writes(&self) -> &[u8] {
        &self.writes
    }

    /// Number of flushes observed.
    #[must_use]
    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
