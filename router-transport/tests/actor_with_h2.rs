//! Drives the connection actor's `CONNECTED` -> stream lifecycle through
//! a real `h2` handshake over a `tokio::io::duplex` pair (SPEC_FULL "Test
//! tooling").

use bytes::Bytes;
use http::{Request, StatusCode};
use router_http2::{Http2Config, ServerSession, StreamRecord, StreamRole};
use router_transport::ConnectionActor;

#[tokio::test(flavor = "multi_thread")]
async fn actor_tracks_a_stream_through_request_and_response() {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let config = Http2Config::default();

    let server_task = tokio::spawn(async move {
        let mut actor = ConnectionActor::new(false);
        let outcome = actor.on_connected(false, false);
        assert!(outcome.grant_read_buffers);
        assert!(!outcome.instantiate_tls);

        let mut server = ServerSession::handshake(server_io, &config)
            .await
            .expect("server handshake");

        let (req, mut respond) = server
            .accept()
            .await
            .expect("a stream arrives")
            .expect("stream accepted cleanly");
        assert_eq!(req.uri().path(), "/stream");

        let mut record = StreamRecord::new(StreamRole::Ingress);
        record.bytes_in = req
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        actor.push_stream(record);

        let response = http::Response::builder()
            .status(StatusCode::OK)
            .body(())
            .expect("valid response");
        let mut send = respond.send_response(response, false).expect("send headers");
        send.send_data(Bytes::from_static(b"ack"), true).expect("send body");

        let mut driven = 0;
        actor.restart_streams(&mut |_s| driven += 1);
        assert_eq!(driven, 1, "the still-open stream must be offered a drive");
        assert_eq!(actor.stream_count(), 1, "nothing to free yet");
    });

    let (mut send_request, connection) = h2::client::handshake(client_io)
        .await
        .expect("client handshake");
    let client_task = tokio::spawn(connection);

    let request = Request::builder()
        .method("POST")
        .uri("https://example.test/stream")
        .header("content-length", "5")
        .body(())
        .expect("valid request");
    let (response_fut, mut send_stream) = send_request.send_request(request, false).expect("send request");
    send_stream.send_data(Bytes::from_static(b"hello"), true).expect("send data");

    let response = response_fut.await.expect("response arrives");
    assert_eq!(response.status(), StatusCode::OK);

    server_task.await.expect("server task completes");
    drop(send_request);
    let _ = client_task.await;
}
