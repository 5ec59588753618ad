//! Per-stream bookkeeping (spec §4.2 "State machine per stream", spec §3
//! "HTTP/2 stream record").

use router_message::{BufferList, ComposedField, MessageContent, MessageHandle};
use router_proto::{LinkHandle, Outcome};
use std::sync::Arc;
use std::time::Instant;

/// A stream's lifecycle. Transitions are monotonic: once `FullyClosed`,
/// a stream never moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    HalfClosed,
    FullyClosed,
}

impl StreamState {
    /// Apply the next observed transition, clamping at `FullyClosed`.
    /// `half_close` is idempotent; closing either side of an already
    /// half-closed stream moves straight to `FullyClosed`.
    pub fn on_half_close(self) -> Self {
        match self {
            StreamState::Open => StreamState::HalfClosed,
            _ => StreamState::FullyClosed,
        }
    }

    pub fn on_full_close(self) -> Self {
        StreamState::FullyClosed
    }

    pub fn is_fully_closed(self) -> bool {
        matches!(self, StreamState::FullyClosed)
    }
}

/// Which side of the translation this stream belongs to (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    /// Peer is an HTTP client; the router accepts the stream.
    Ingress,
    /// The router acts as an HTTP client against this stream's peer.
    Egress,
}

/// Everything the adapter tracks for one HTTP/2 stream over its
/// lifetime (spec §3 "HTTP/2 stream record").
pub struct StreamRecord {
    pub role: StreamRole,
    pub state: StreamState,
    /// Assigned on first header submission for egress; echoed from the
    /// peer for ingress. `None` until that first header exchange has
    /// happened.
    pub stream_id: Option<u32>,
    pub link: Option<LinkHandle>,
    pub content: Option<Arc<MessageContent>>,
    pub handle: Option<MessageHandle>,

    /// Composition state: built up while the stream's first delivery is
    /// still being assembled, then dropped once it is routed.
    pub app_properties_builder: Option<ComposedField>,
    pub footer_builder: Option<ComposedField>,
    pub body_buffer: BufferList,

    pub http_method: Option<http::Method>,
    pub response_status: Option<http::StatusCode>,
    pub reply_to: Option<String>,

    pub entire_header_arrived: bool,
    pub header_and_props_composed: bool,
    pub body_data_added_to_msg: bool,
    pub use_footer_properties: bool,
    pub entire_footer_arrived: bool,
    /// Set once a peer `RST_STREAM` or a released settle after partial
    /// transfer forces the stream closed; suppresses any further writes.
    pub stream_force_closed: bool,
    pub disp_updated: bool,
    pub out_msg_header_sent: bool,
    pub out_msg_body_sent: bool,
    pub out_msg_has_body: bool,
    pub out_msg_has_footer: bool,
    pub out_msg_data_flag_eof: bool,
    pub out_msg_send_complete: bool,

    pub disposition: Option<Outcome>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub start_time: Instant,
}

impl StreamRecord {
    pub fn new(role: StreamRole) -> Self {
        Self {
            role,
            state: StreamState::Open,
            stream_id: None,
            link: None,
            content: None,
            handle: None,
            app_properties_builder: None,
            footer_builder: None,
            body_buffer: BufferList::new(),
            http_method: None,
            response_status: None,
            reply_to: None,
            entire_header_arrived: false,
            header_and_props_composed: false,
            body_data_added_to_msg: false,
            use_footer_properties: false,
            entire_footer_arrived: false,
            stream_force_closed: false,
            disp_updated: false,
            out_msg_header_sent: false,
            out_msg_body_sent: false,
            out_msg_has_body: false,
            out_msg_has_footer: false,
            out_msg_data_flag_eof: false,
            out_msg_send_complete: false,
            disposition: None,
            bytes_in: 0,
            bytes_out: 0,
            start_time: Instant::now(),
        }
    }

    /// The stream is eligible to be freed once both sides are done and
    /// its outbound message has finished sending (spec §4.2 point 6,
    /// §4.3 `restart_streams`).
    pub fn is_reclaimable(&self) -> bool {
        self.state.is_fully_closed() && self.out_msg_send_complete
    }

    pub fn force_close(&mut self) {
        self.stream_force_closed = true;
        self.state = StreamState::FullyClosed;
    }

    pub fn latency(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions_are_monotonic() {
        let s = StreamState::Open;
        let s = s.on_half_close();
        assert_eq!(s, StreamState::HalfClosed);
        let s = s.on_half_close();
        assert_eq!(s, StreamState::FullyClosed);
        // a further half-close observation cannot move backwards
        let s = s.on_half_close();
        assert_eq!(s, StreamState::FullyClosed);
    }

    #[test]
    fn force_close_is_immediate() {
        let mut rec = StreamRecord::new(StreamRole::Ingress);
        rec.force_close();
        assert!(rec.state.is_fully_closed());
        assert!(rec.stream_force_closed);
    }

    #[test]
    fn reclaimable_requires_both_close_and_send_complete() {
        let mut rec = StreamRecord::new(StreamRole::Egress);
        rec.state = StreamState::FullyClosed;
        assert!(!rec.is_reclaimable());
        rec.out_msg_send_complete = true;
        assert!(rec.is_reclaimable());
    }

    #[test]
    fn stream_id_defaults_to_unassigned() {
        let rec = StreamRecord::new(StreamRole::Egress);
        assert_eq!(rec.stream_id, None);
    }
}
