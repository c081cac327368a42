//! Property tests for the codec round-trip invariants.

use proptest::prelude::*;
use test_support::MemoryTransport;
use wire::{DELIMITER, decode_varint, encode_varint_to_vec, read_token, write_token};

/// Protocol-shaped strings: printable ASCII and multibyte UTF-8, no newline.
fn token_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9/._+-]{0,64}(\u{00e9}|\u{4e16}|\u{1F600}){0,4}")
        .expect("regex is valid")
}

proptest! {
    #[test]
    fn tokens_round_trip_through_the_stream_codec(token in token_strategy()) {
        let mut sink = MemoryTransport::new(&[]);
        write_token(&mut sink, token.as_bytes()).expect("payload is valid");

        let mut source = MemoryTransport::new(sink.writes());
        prop_assert_eq!(read_token(&mut source).expect("frame reads back"), token);
    }

    #[test]
    fn frames_end_with_their_only_delimiter(token in token_strategy()) {
        let mut sink = MemoryTransport::new(&[]);
        write_token(&mut sink, token.as_bytes()).expect("payload is valid");

        let frame = sink.writes();
        prop_assert_eq!(*frame.last().expect("frame is never empty"), DELIMITER);
        prop_assert_eq!(
            frame.iter().filter(|&&byte| byte == DELIMITER).count(),
            1
        );
    }

    #[test]
    fn varints_round_trip_through_the_slice_codec(value in any::<u64>()) {
        let mut encoded = Vec::new();
        encode_varint_to_vec(value, &mut encoded);
        let (decoded, rest) = decode_varint(&encoded).expect("encoding is canonical");
        prop_assert_eq!(decoded, value);
        prop_assert!(rest.is_empty());
    }
}
