//! Retry helpers for blocking reads over possibly non-blocking sources.
//!
//! A source registered as non-blocking surfaces `WouldBlock` instead of
//! suspending. The helpers below retry after a short sleep so callers never
//! busy-spin; the async codec has no equivalent because the runtime itself
//! suspends the read.

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

/// Pause between retries when a non-blocking source has no data yet.
const RETRY_INTERVAL: Duration = Duration::from_millis(1);

/// Reads a single byte, reporting end-of-stream as `None`.
pub(crate) fn read_byte_or_eof<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(RETRY_INTERVAL);
            }
            Err(error) => return Err(error),
        }
    }
}

/// Fills `buf` completely, retrying short reads.
///
/// End-of-stream before the buffer is full fails with
/// [`io::ErrorKind::UnexpectedEof`]; the caller decides whether that means a
/// truncated frame.
pub(crate) fn read_exact_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a frame",
                ));
            }
            Ok(count) => filled += count,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(RETRY_INTERVAL);
            }
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Read source that interleaves `WouldBlock` errors with data chunks.
    struct StutteringReader {
        script: VecDeque<io::Result<Vec<u8>>>,
    }

    impl StutteringReader {
        fn new(script: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl Read for StutteringReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.script.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(error)) => Err(error),
                None => Ok(0),
            }
        }
    }

    fn would_block() -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "not ready"))
    }

    #[test]
    fn read_exact_survives_would_block_and_short_reads() {
        let mut reader = StutteringReader::new(vec![
            would_block(),
            Ok(vec![1, 2]),
            would_block(),
            would_block(),
            Ok(vec![3]),
            Ok(vec![4, 5]),
        ]);

        let mut buf = [0u8; 5];
        read_exact_retrying(&mut reader, &mut buf).expect("all chunks should be assembled");
        assert_eq!(buf, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn read_exact_reports_eof_inside_a_frame() {
        let mut reader = StutteringReader::new(vec![Ok(vec![1, 2])]);
        let mut buf = [0u8; 4];
        let err = read_exact_retrying(&mut reader, &mut buf).expect_err("EOF mid-frame");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn byte_reader_retries_then_sees_eof() {
        let mut reader = StutteringReader::new(vec![would_block(), Ok(vec![0x2a])]);
        assert_eq!(
            read_byte_or_eof(&mut reader).expect("byte should arrive"),
            Some(0x2a)
        );
        assert_eq!(read_byte_or_eof(&mut reader).expect("clean EOF"), None);
    }
}
