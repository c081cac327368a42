//! Error taxonomy shared by the codec, the wire exchanges, and the muxer.

use std::io;

use crate::{MAX_TOKEN_PAYLOAD, PROTOCOL_ID};

/// Errors surfaced by negotiation operations.
///
/// End-of-stream at a token boundary is not represented here: the listener
/// loop reports it as an absent result and `try_select` treats it as a
/// rejection. Only end-of-stream inside a frame becomes
/// [`NegotiationError::TransportClosed`].
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    /// The first token received was not the multistream protocol id.
    #[error("peer announced {token:?} instead of {:?}", PROTOCOL_ID)]
    VersionMismatch {
        /// Token the peer announced in place of the protocol id.
        token: String,
    },

    /// The peer declared a frame longer than [`MAX_TOKEN_PAYLOAD`].
    #[error("declared frame length {declared} exceeds the {} byte limit", MAX_TOKEN_PAYLOAD)]
    MessageTooLarge {
        /// Length declared by the varint prefix.
        declared: u64,
    },

    /// The final payload byte was not the newline delimiter.
    #[error("token frame does not end with the newline delimiter")]
    MissingDelimiter,

    /// The payload was not valid UTF-8 or contained an interior newline.
    #[error("token payload is not a valid protocol string")]
    BadEncoding,

    /// The peer rejected every attempted protocol.
    #[error("peer supports none of the attempted protocols: {}", .attempted.join(", "))]
    ProtocolNotSupported {
        /// Protocols offered to the peer, in the order they were attempted.
        attempted: Vec<String>,
    },

    /// A selection reply was neither the proposed protocol nor `na`.
    #[error("peer replied with unexpected token {token:?}")]
    UnexpectedToken {
        /// The reply token that was received.
        token: String,
    },

    /// A cancellation signal fired while the operation was suspended.
    #[error("negotiation was cancelled")]
    Cancelled,

    /// The transport reached end-of-stream in the middle of a frame.
    #[error("transport closed in the middle of a frame")]
    TransportClosed,

    /// The underlying transport reported an I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl NegotiationError {
    /// Maps the error onto the closest [`io::ErrorKind`].
    ///
    /// Used when a negotiation failure must surface through a `std::io`
    /// read/write signature, as in the lazy stream wrapper.
    #[must_use]
    pub fn io_error_kind(&self) -> io::ErrorKind {
        match self {
            Self::VersionMismatch { .. }
            | Self::MessageTooLarge { .. }
            | Self::MissingDelimiter
            | Self::BadEncoding
            | Self::UnexpectedToken { .. } => io::ErrorKind::InvalidData,
            Self::ProtocolNotSupported { .. } => io::ErrorKind::Unsupported,
            Self::Cancelled => io::ErrorKind::Interrupted,
            Self::TransportClosed => io::ErrorKind::UnexpectedEof,
            Self::Io(error) => error.kind(),
        }
    }
}

impl From<NegotiationError> for io::Error {
    fn from(error: NegotiationError) -> Self {
        match error {
            NegotiationError::Io(inner) => inner,
            other => Self::new(other.io_error_kind(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_mismatch_names_both_tokens() {
        let error = NegotiationError::VersionMismatch {
            token: "/bogus/9.9.9".to_string(),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("/bogus/9.9.9"), "got: {rendered}");
        assert!(rendered.contains(PROTOCOL_ID), "got: {rendered}");
    }

    #[test]
    fn protocol_not_supported_lists_attempts_in_order() {
        let error = NegotiationError::ProtocolNotSupported {
            attempted: vec!["/d".to_string(), "/e".to_string()],
        };
        assert!(error.to_string().contains("/d, /e"));
    }

    #[test]
    fn io_error_conversion_preserves_the_original_kind() {
        let error =
            NegotiationError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        let converted = io::Error::from(error);
        assert_eq!(converted.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn negotiation_failures_map_to_stable_io_kinds() {
        let cases = [
            (
                NegotiationError::MissingDelimiter,
                io::ErrorKind::InvalidData,
            ),
            (
                NegotiationError::ProtocolNotSupported { attempted: vec![] },
                io::ErrorKind::Unsupported,
            ),
            (NegotiationError::Cancelled, io::ErrorKind::Interrupted),
            (
                NegotiationError::TransportClosed,
                io::ErrorKind::UnexpectedEof,
            ),
        ];

        for (error, kind) in cases {
            assert_eq!(error.io_error_kind(), kind);
        }
    }
}
