//! Drives a loopback `h2` client/server handshake over a `tokio::io::duplex`
//! pair, the same harness shape the teacher uses for its own HTTP/2 proto
//! tests (SPEC_FULL "Test tooling").

use bytes::Bytes;
use http::{Request, StatusCode};
use router_http2::{Http2Config, ServerSession};

#[tokio::test(flavor = "multi_thread")]
async fn server_accepts_a_request_and_responds() {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let config = Http2Config::default();

    let server_task = tokio::spawn(async move {
        let mut server = ServerSession::handshake(server_io, &config)
            .await
            .expect("server handshake");
        let (req, mut respond) = server
            .accept()
            .await
            .expect("a stream arrives")
            .expect("stream accepted cleanly");
        assert_eq!(req.uri().path(), "/widgets");

        let response = http::Response::builder()
            .status(StatusCode::OK)
            .body(())
            .expect("valid response");
        let mut send = respond.send_response(response, false).expect("send headers");
        send.send_data(Bytes::from_static(b"ok"), true)
            .expect("send body");
    });

    let (mut send_request, connection) = h2::client::handshake(client_io)
        .await
        .expect("client handshake");
    let client_task = tokio::spawn(connection);

    let request = Request::builder()
        .method("GET")
        .uri("https://example.test/widgets")
        .body(())
        .expect("valid request");
    let (response_fut, _send_stream) = send_request.send_request(request, true).expect("send request");

    let response = response_fut.await.expect("response arrives");
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    let chunk = body.data().await.expect("a data chunk").expect("chunk ok");
    assert_eq!(&chunk[..], b"ok");

    server_task.await.expect("server task completes");
    drop(send_request);
    let _ = client_task.await;
}
