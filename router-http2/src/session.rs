//! The per-connection HTTP/2 session: a thin wrapper around `h2`'s
//! server and client connections that the connection actor in
//! `router-transport` drives (spec §4.2, §4.3).
//!
//! This crate does not own the raw-connection event loop; it exposes
//! the handshake and accept/request entry points the actor calls from
//! its `CONNECTED`/`READ` handling, plus the GOAWAY bookkeeping spec
//! §4.2 names.

use crate::config::Http2Config;
use h2::Reason;
use router_error::BoxError;
use std::collections::HashSet;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Server-side HTTP/2 session: accepts peer-initiated streams.
pub struct ServerSession<T> {
    conn: h2::server::Connection<T, bytes::Bytes>,
}

impl<T> ServerSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn handshake(io: T, config: &Http2Config) -> Result<Self, BoxError> {
        let conn = config
            .server_builder()
            .handshake(io)
            .await
            .map_err(|e| router_error::error!(e))?;
        Ok(Self { conn })
    }

    /// Accept the next peer-initiated stream, or `None` once the peer
    /// has sent GOAWAY and every stream has drained.
    pub async fn accept(
        &mut self,
    ) -> Option<Result<(http::Request<h2::RecvStream>, h2::server::SendResponse<bytes::Bytes>), h2::Error>> {
        self.conn.accept().await
    }

    pub fn graceful_shutdown(&mut self) {
        self.conn.graceful_shutdown();
    }

    pub fn abrupt_shutdown(&mut self, reason: Reason) {
        self.conn.abrupt_shutdown(reason);
    }
}

/// Client-side HTTP/2 session: the router acts as a client against an
/// egress peer.
pub struct ClientSession<T> {
    send_request: h2::client::SendRequest<bytes::Bytes>,
    conn: h2::client::Connection<T>,
}

impl<T> ClientSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub async fn handshake(io: T, config: &Http2Config) -> Result<Self, BoxError> {
        let (send_request, conn) = config
            .client_builder()
            .handshake(io)
            .await
            .map_err(|e| router_error::error!(e))?;
        Ok(Self { send_request, conn })
    }

    pub fn send_request(&mut self) -> &mut h2::client::SendRequest<bytes::Bytes> {
        &mut self.send_request
    }

    /// Drive the client connection's background I/O; the caller spawns
    /// this as its own task and only interacts with `send_request` and
    /// the returned response futures.
    pub async fn drive(self) -> Result<(), h2::Error> {
        self.conn.await
    }

    pub fn abrupt_shutdown(&mut self, reason: Reason) {
        self.conn.abrupt_shutdown(reason);
    }
}

/// Tracks the peer's `GOAWAY` boundary so the actor can free any stream
/// id the peer will never process (spec §4.2 "GOAWAY": "any stream id
/// greater than `last-stream-id` is freed").
///
/// Stream ids are tracked here as the plain `u32` the wire encodes,
/// rather than `h2`'s own `StreamId` type: callers read the numeric id
/// off their own `StreamRecord` bookkeeping, not off `h2` directly.
#[derive(Debug, Default)]
pub struct GoAwayBoundary {
    last_stream_id: Option<u32>,
}

impl GoAwayBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, last_stream_id: u32) {
        debug!(last_stream_id, "peer sent GOAWAY");
        self.last_stream_id = Some(last_stream_id);
    }

    /// Whether `id` is beyond what the peer promised to process and
    /// should be freed unrouted.
    pub fn is_unprocessable(&self, id: u32) -> bool {
        self.last_stream_id.is_some_and(|last| id > last)
    }

    /// Split `ids` into those the peer will still process and those
    /// that must be freed now.
    pub fn partition(&self, ids: impl IntoIterator<Item = u32>) -> (Vec<u32>, Vec<u32>) {
        let mut keep = Vec::new();
        let mut freed = Vec::new();
        for id in ids {
            if self.is_unprocessable(id) {
                freed.push(id);
            } else {
                keep.push(id);
            }
        }
        (keep, freed)
    }
}

/// Map a protocol-violation kind observed while decoding into the HTTP/2
/// `Reason` the adapter submits on GOAWAY (spec §4.3 "Failure
/// semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolFault {
    BadMagic,
    FrameSizeError,
    FlowControlViolation,
    General,
}

impl ProtocolFault {
    pub fn reason(self) -> Reason {
        match self {
            ProtocolFault::BadMagic => Reason::PROTOCOL_ERROR,
            ProtocolFault::FrameSizeError => Reason::FRAME_SIZE_ERROR,
            // The real `h2` codec does not expose a distinct "flood"
            // reason for flow-control abuse; the adapter closes the
            // connection the same way it would any other flow-control
            // protocol violation.
            ProtocolFault::FlowControlViolation => Reason::FLOW_CONTROL_ERROR,
            ProtocolFault::General => Reason::INTERNAL_ERROR,
        }
    }
}

/// Streams still open when the connection tears down, so the caller can
/// abort their in-flight messages and release their deliveries (spec
/// §4.3: "Any partially-received message on a force-closed stream is
/// marked aborted; its delivery is released").
pub fn streams_to_abort(open: &HashSet<u32>) -> Vec<u32> {
    let mut ids: Vec<_> = open.iter().copied().collect();
    ids.sort_unstable();
    if !ids.is_empty() {
        warn!(count = ids.len(), "aborting streams on connection teardown");
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_frees_only_streams_past_last_stream_id() {
        let mut boundary = GoAwayBoundary::new();
        boundary.record(5);
        let (keep, freed) = boundary.partition([1, 3, 5, 7, 9]);
        assert_eq!(keep, vec![1, 3, 5]);
        assert_eq!(freed, vec![7, 9]);
    }

    #[test]
    fn boundary_with_no_goaway_frees_nothing() {
        let boundary = GoAwayBoundary::new();
        assert!(!boundary.is_unprocessable(1000));
    }

    #[test]
    fn protocol_fault_maps_to_distinct_reasons() {
        assert_eq!(ProtocolFault::BadMagic.reason(), Reason::PROTOCOL_ERROR);
        assert_eq!(ProtocolFault::FrameSizeError.reason(), Reason::FRAME_SIZE_ERROR);
    }
}
