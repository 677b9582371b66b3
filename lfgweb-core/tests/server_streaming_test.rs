use fake_server::{FakeServer, ScriptedResponse, concat, message, ok_trailer, trailer};
use lfgweb_core::{
    CallContext, CallError, CancelHandle, ClientConfig, StreamOutcome, bytes::Bytes,
    grpc_web::frame::FrameError, tonic::Code, transport::TransportError,
};
use std::time::Duration;
use tokio_stream::StreamExt;

mod fake_server;

const SUBSCRIBE_GROUPS: &str = "/lfg.Lfg/SubscribeGroups";

fn three_messages() -> Vec<u8> {
    concat(&[message(b"m1"), message(b"m2"), message(b"m3"), ok_trailer()])
}

fn msg(payload: &'static [u8]) -> StreamOutcome {
    StreamOutcome::Message(Bytes::from_static(payload))
}

#[tokio::test]
async fn test_messages_arrive_in_wire_order() {
    let server = FakeServer::replying(ScriptedResponse::ok(three_messages()).chunked(1));
    let mut client = server.client();

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));
    assert_eq!(stream.next().await.unwrap(), msg(b"m2"));
    assert_eq!(stream.next().await.unwrap(), msg(b"m3"));
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::End);

    // Finished streams stay finished and stop reading.
    let reads = server.reads();
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::End);
    assert_eq!(server.reads(), reads);
}

#[tokio::test]
async fn test_chunk_size_does_not_change_the_result() {
    let raw = three_messages();

    for size in [1, 2, 3, 4, 5, 6, 7, 11, raw.len()] {
        let server = FakeServer::replying(ScriptedResponse::ok(raw.clone()).chunked(size));
        let mut client = server.client();

        let stream = client
            .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
            .await
            .unwrap();

        let messages: Vec<_> = stream.into_stream().map(|m| m.unwrap()).collect().await;
        assert_eq!(messages, vec!["m1", "m2", "m3"], "chunk size {size}");
    }
}

#[tokio::test]
async fn test_body_closed_without_trailer_ends_cleanly() {
    let server = FakeServer::replying(ScriptedResponse::ok(message(b"only")));
    let mut client = server.client();

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"only"));
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::End);
}

#[tokio::test]
async fn test_unauthenticated_trailer_terminates_stream() {
    let server = FakeServer::replying(ScriptedResponse::ok(concat(&[
        message(b"m1"),
        trailer("grpc-status: 16\r\ngrpc-message: session expired\r\n"),
    ])));
    let mut client = server.client();

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));
    match stream.next().await.unwrap_err() {
        CallError::Unauthenticated { message } => assert_eq!(message, "session expired"),
        other => panic!("Expected Unauthenticated, got {other:?}"),
    }
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::End);
}

#[tokio::test]
async fn test_error_trailer_is_yielded_after_messages() {
    let server = FakeServer::replying(ScriptedResponse::ok(concat(&[
        message(b"m1"),
        trailer("grpc-status: 14\r\ngrpc-message: shutting down\r\n"),
    ])));
    let mut client = server.client();

    let stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    let results: Vec<_> = stream.into_stream().collect().await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap(), "m1");
    assert_eq!(results[1].as_ref().unwrap_err().code(), Code::Unavailable);
}

#[tokio::test]
async fn test_header_status_rejects_stream_before_reading() {
    let server = FakeServer::replying(
        ScriptedResponse::ok(three_messages())
            .with_header("grpc-status", "7")
            .with_header("grpc-message", "not a member"),
    );
    let mut client = server.client();

    let err = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .err()
        .unwrap();

    assert_eq!(err.code(), Code::PermissionDenied);
    assert_eq!(server.reads(), 0);
}

#[tokio::test]
async fn test_truncated_stream_is_malformed() {
    let mut raw = concat(&[message(b"m1"), message(b"m2")]);
    raw.truncate(raw.len() - 1);

    let server = FakeServer::replying(ScriptedResponse::ok(raw).chunked(3));
    let mut client = server.client();

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));
    assert!(matches!(
        stream.next().await.unwrap_err(),
        CallError::Malformed(FrameError::UnexpectedEof)
    ));
}

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
    // Header only: declares 4 KiB that never arrive.
    let header = vec![0x00, 0x00, 0x00, 0x10, 0x00];
    let server = FakeServer::replying(ScriptedResponse::ok(header).then_hang());
    let mut client =
        server.client_with(ClientConfig::new("http://lfg.test").with_max_message_size(1024));

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert!(matches!(
        stream.next().await.unwrap_err(),
        CallError::Malformed(FrameError::OversizedMessage {
            length: 4096,
            max: 1024
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_mid_stream_stops_reading() {
    let server = FakeServer::replying(ScriptedResponse::in_chunks(vec![message(b"m1")]).then_hang());
    let mut client = server.client();

    let cancel = CancelHandle::new();
    let ctx = CallContext::new(SUBSCRIBE_GROUPS).with_cancel(cancel.token());
    let mut stream = client.server_streaming(ctx, Vec::new()).await.unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
    assert!(stream.is_canceled());

    let reads = server.reads();
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
    assert_eq!(server.reads(), reads);
}

#[tokio::test]
async fn test_canceled_before_head_sends_nothing() {
    let server = FakeServer::replying(ScriptedResponse::ok(three_messages()));
    let mut client = server.client();

    let cancel = CancelHandle::new();
    cancel.cancel();

    let mut stream = client
        .server_streaming(
            CallContext::new(SUBSCRIBE_GROUPS).with_cancel(cancel.token()),
            Vec::new(),
        )
        .await
        .unwrap();

    assert!(stream.is_canceled());
    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_dropping_client_cancels_live_stream() {
    let server = FakeServer::replying(ScriptedResponse::ok(three_messages()).then_hang());
    let mut client = server.client();

    let mut stream = client
        .server_streaming(CallContext::new(SUBSCRIBE_GROUPS), Vec::new())
        .await
        .unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));
    drop(client);

    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_timeout_bounds_the_stream() {
    let server = FakeServer::replying(ScriptedResponse::in_chunks(vec![message(b"m1")]).then_hang());
    let mut client = server.client();

    let ctx = CallContext::new(SUBSCRIBE_GROUPS).with_timeout(Duration::from_secs(30));
    let mut stream = client.server_streaming(ctx, Vec::new()).await.unwrap();

    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));
    assert!(matches!(
        stream.next().await.unwrap_err(),
        CallError::Transport(TransportError::Timeout(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_config_timeout_does_not_apply_to_streams() {
    let server = FakeServer::replying(ScriptedResponse::in_chunks(vec![message(b"m1")]).then_hang());
    let mut client = server.client_with(
        ClientConfig::new("http://lfg.test").with_timeout(Duration::from_secs(1)),
    );

    let cancel = CancelHandle::new();
    let ctx = CallContext::new(SUBSCRIBE_GROUPS).with_cancel(cancel.token());
    let mut stream = client.server_streaming(ctx, Vec::new()).await.unwrap();
    assert_eq!(stream.next().await.unwrap(), msg(b"m1"));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
    });

    assert_eq!(stream.next().await.unwrap(), StreamOutcome::Canceled);
}
