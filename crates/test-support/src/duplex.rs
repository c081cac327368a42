//! Blocking in-memory duplex pipe.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex};

/// One direction of the pipe: a byte queue plus a closed flag.
#[derive(Debug, Default)]
struct Channel {
    queue: Mutex<ChannelState>,
    readable: Condvar,
}

#[derive(Debug, Default)]
struct ChannelState {
    bytes: VecDeque<u8>,
    closed: bool,
}

impl Channel {
    fn push(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.queue.lock().expect("pipe lock is never poisoned");
        if state.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "peer end of the pipe was dropped",
            ));
        }
        state.bytes.extend(buf);
        drop(state);
        self.readable.notify_all();
        Ok(buf.len())
    }

    fn pull(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.queue.lock().expect("pipe lock is never poisoned");
        while state.bytes.is_empty() && !state.closed {
            state = self
                .readable
                .wait(state)
                .expect("pipe lock is never poisoned");
        }
        if state.bytes.is_empty() {
            return Ok(0);
        }
        let count = buf.len().min(state.bytes.len());
        for slot in buf.iter_mut().take(count) {
            *slot = state.bytes.pop_front().expect("count bytes are queued");
        }
        Ok(count)
    }

    fn close(&self) {
        let mut state = self.queue.lock().expect("pipe lock is never poisoned");
        state.closed = true;
        drop(state);
        self.readable.notify_all();
    }
}

/// One end of a connected in-memory byte stream pair.
///
/// Reads block until the peer writes or hangs up; dropping an end closes
/// both directions it participates in, so the peer observes EOF on read and
/// `BrokenPipe` on write.
#[derive(Debug)]
pub struct DuplexPipe {
    incoming: Arc<Channel>,
    outgoing: Arc<Channel>,
}

impl DuplexPipe {
    /// Creates a connected pair of pipe ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Channel::default());
        let b_to_a = Arc::new(Channel::default());

        let a = Self {
            incoming: Arc::clone(&b_to_a),
            outgoing: Arc::clone(&a_to_b),
        };
        let b = Self {
            incoming: a_to_b,
            outgoing: b_to_a,
        };
        (a, b)
    }
}

impl Read for DuplexPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.incoming.pull(buf)
    }
}

impl Write for DuplexPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outgoing.push(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for DuplexPipe {
    fn drop(&mut self) {
        self.outgoing.close();
        self.incoming.close();
    }
}
