//! End-to-end async negotiation over `tokio::io::duplex`.
//!
//! The async surface must behave exactly like the blocking one, so these
//! tests mirror the blocking scenarios: selection hits and misses, handler
//! dispatch, `ls` probing, and the lazy wrapper.

use std::sync::Arc;

use muxer::{
    AsyncStream, Dispatch, HandlerFuture, Muxer, NegotiationError, select_one_of_async,
    select_proto_or_fail_async,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

fn muxer_with(protocols: &[&str]) -> Arc<Muxer> {
    let muxer = Muxer::new();
    for protocol in protocols {
        muxer.add_handler_func(*protocol, Dispatch::Neither);
    }
    Arc::new(muxer)
}

#[tokio::test]
async fn single_registered_protocol_is_selected_on_both_ends() {
    let muxer = muxer_with(&["/a"]);
    let (mut listener_end, mut initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.negotiate_async(&mut listener_end).await });

    select_proto_or_fail_async("/a", &mut initiator_end)
        .await
        .expect("the listener supports /a");

    let result = listener
        .await
        .expect("listener task")
        .expect("negotiation runs")
        .expect("a protocol was selected");
    assert_eq!(result.protocol, "/a");
    assert_eq!(result.handler.protocol(), "/a");
}

#[tokio::test]
async fn exhausted_candidates_fail_both_ends_consistently() {
    let muxer = muxer_with(&["/a", "/b"]);
    let (mut listener_end, mut initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.negotiate_async(&mut listener_end).await });

    match select_one_of_async(&["/d", "/e"], &mut initiator_end).await {
        Err(NegotiationError::ProtocolNotSupported { attempted }) => {
            assert_eq!(attempted, ["/d", "/e"]);
        }
        other => panic!("expected ProtocolNotSupported, got {other:?}"),
    }
    drop(initiator_end);

    let outcome = listener
        .await
        .expect("listener task")
        .expect("negotiation runs");
    assert!(outcome.is_none());
}

#[tokio::test]
async fn later_candidate_wins_after_earlier_misses() {
    let muxer = muxer_with(&["/a", "/b", "/c"]);
    let (mut listener_end, mut initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.negotiate_async(&mut listener_end).await });

    let chosen = select_one_of_async(&["/d", "/e", "/c"], &mut initiator_end)
        .await
        .expect("third candidate hits");
    assert_eq!(chosen, "/c");

    let result = listener
        .await
        .expect("listener task")
        .expect("negotiation runs")
        .expect("a protocol was selected");
    assert_eq!(result.protocol, "/c");
}

fn ping_pong<'a>(protocol: &'a str, stream: &'a mut dyn AsyncStream) -> HandlerFuture<'a> {
    Box::pin(async move {
        assert_eq!(protocol, "/ping/1.0.0");
        let mut request = [0u8; 4];
        stream.read_exact(&mut request).await.expect("request arrives");
        assert_eq!(&request, b"ping");
        stream.write_all(b"pong").await.is_ok()
    })
}

#[tokio::test]
async fn handle_async_dispatches_the_suspending_callback() {
    let muxer = Muxer::new();
    muxer.add_handler_func("/ping/1.0.0", Dispatch::from_async(ping_pong));
    let muxer = Arc::new(muxer);

    let (mut listener_end, mut initiator_end) = duplex(256);
    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.handle_async(&mut listener_end).await });

    select_proto_or_fail_async("/ping/1.0.0", &mut initiator_end)
        .await
        .expect("selection succeeds");
    initiator_end.write_all(b"ping").await.expect("request writes");

    let mut reply = [0u8; 4];
    initiator_end.read_exact(&mut reply).await.expect("reply arrives");
    assert_eq!(&reply, b"pong");

    assert!(listener.await.expect("listener task").expect("handle runs"));
}

#[tokio::test]
async fn handle_async_reports_failure_for_a_sync_only_handler() {
    // A blocking callback cannot run on a suspending stream; the dispatch
    // reports failure instead of blocking the runtime.
    let muxer = Muxer::new();
    muxer.add_handler_func("/blocking-only", Dispatch::from_sync(|_, _| true));
    let muxer = Arc::new(muxer);

    let (mut listener_end, mut initiator_end) = duplex(256);
    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.handle_async(&mut listener_end).await });

    select_proto_or_fail_async("/blocking-only", &mut initiator_end)
        .await
        .expect("selection itself succeeds");
    drop(initiator_end);

    assert!(!listener.await.expect("listener task").expect("handle runs"));
}

#[tokio::test]
async fn ls_probing_matches_the_registry() {
    let muxer = muxer_with(&["a", "b", "c", "d", "e"]);
    let (mut listener_end, mut initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.negotiate_async(&mut listener_end).await });

    wire::aio::handshake_as_initiator(&mut initiator_end)
        .await
        .expect("handshake succeeds");
    wire::aio::write_token(&mut initiator_end, muxer::LS_TOKEN.as_bytes())
        .await
        .expect("ls request writes");
    let listing = wire::aio::read_ls(&mut initiator_end)
        .await
        .expect("listing parses");
    assert_eq!(listing, ["a", "b", "c", "d", "e"]);

    drop(initiator_end);
    assert!(
        listener
            .await
            .expect("listener task")
            .expect("negotiation runs")
            .is_none()
    );
}

// ============================================================================
// Async lazy wrapper
// ============================================================================

#[tokio::test]
async fn lazy_wrapper_handshakes_on_first_write_then_passes_through() {
    let muxer = muxer_with(&["/echo/1.0.0"]);
    let (mut listener_end, initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move {
        let result = server
            .negotiate_async(&mut listener_end)
            .await
            .expect("negotiation runs")
            .expect("a protocol was selected");
        assert_eq!(result.protocol, "/echo/1.0.0");

        let mut payload = [0u8; 5];
        listener_end.read_exact(&mut payload).await.expect("payload arrives");
        assert_eq!(&payload, b"hello");
        listener_end.write_all(b"world").await.expect("reply writes");
    });

    let mut lazy = muxer::aio::LazyStream::select(initiator_end, "/echo/1.0.0");
    assert!(!lazy.negotiated());

    lazy.write_all(b"hello").await.expect("first write handshakes then forwards");
    assert!(lazy.negotiated());

    let mut reply = [0u8; 5];
    lazy.read_exact(&mut reply).await.expect("reply passes through");
    assert_eq!(&reply, b"world");

    listener.await.expect("listener task");
}

#[tokio::test]
async fn lazy_wrapper_with_unsupported_protocol_fails_every_operation() {
    let muxer = muxer_with(&["/echo/1.0.0"]);
    let (mut listener_end, initiator_end) = duplex(256);

    let server = Arc::clone(&muxer);
    let listener = tokio::spawn(async move { server.negotiate_async(&mut listener_end).await });

    let mut lazy = muxer::aio::LazyStream::select(initiator_end, "/THIS_IS_WRONG");

    let error = lazy.write_all(b"data").await.expect_err("handshake is rejected");
    assert_eq!(error.kind(), std::io::ErrorKind::Unsupported);

    let mut buf = [0u8; 1];
    assert_eq!(
        lazy.read(&mut buf).await.expect_err("read fails too").kind(),
        std::io::ErrorKind::Unsupported
    );

    drop(lazy);
    assert!(
        listener
            .await
            .expect("listener task")
            .expect("negotiation runs")
            .is_none()
    );
}
