//! Egress pipeline: the router acts as an HTTP/2 client against a peer,
//! translating a settled delivery into a request/response exchange
//! (spec §4.2 "Egress").

use crate::config::MAX_DATA_READ_CHUNK;
use crate::translate::app_properties_to_headers;
use bytes::Bytes;
use router_message::{MessageHandle, Q2Signal, Section, WindowResult};
use router_proto::{Direction, HttpDisposition, Outcome, map_disposition};
use tracing::trace;

/// What the egress driver should do next after trying to pull more body
/// bytes out of a [`MessageHandle`] (spec §4.2 egress step 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataAction {
    /// Send this chunk; `end_stream` is set if it is also the last one.
    /// `q2_signal` is whatever the content reported while reclaiming the
    /// bytes this read just consumed — a caller bridging to
    /// `router-transport` reacts to `BecameUnblocked` by waking the
    /// producer's connection (spec §4.1 Q2, §5 "Weak references across
    /// threads").
    Send {
        chunk: Bytes,
        end_stream: bool,
        q2_signal: Q2Signal,
    },
    /// No write capacity, or the body hasn't reached `BODY` depth yet;
    /// the caller must resume this stream later (spec: "the codec must
    /// be told to resume the stream").
    Deferred,
    /// The body is drained and a footer is ready; submit it as a
    /// trailing `HEADERS` frame instead of more `DATA`.
    SubmitFooter,
    /// Nothing more to send and there is no footer.
    Done,
}

/// Drive one iteration of the egress DATA read callback. `write_capacity`
/// is the raw connection's current outgoing byte budget; zero means the
/// caller must defer regardless of what the window has released.
pub fn poll_data(handle: &mut MessageHandle, write_capacity: usize) -> DataAction {
    if write_capacity == 0 {
        return DataAction::Deferred;
    }
    if !handle.content().parse_reached(Section::Body) {
        // Body section hasn't even been reached by the parser yet.
        return DataAction::Deferred;
    }

    let want = write_capacity.min(MAX_DATA_READ_CHUNK);
    match handle.poll_window(want) {
        WindowResult::BodyOk(_) => {
            let (chunk, q2_signal) = handle.read_released();
            let chunk = chunk.unwrap_or_default();
            trace!(len = chunk.len(), "egress data chunk released");
            // Look ahead: if releasing exhausted the body, decide whether
            // this chunk also carries END_STREAM or hands off to a footer.
            let end_stream = matches!(handle.poll_window(1), WindowResult::NoMore);
            DataAction::Send {
                chunk,
                end_stream,
                q2_signal,
            }
        }
        WindowResult::FooterOk => DataAction::SubmitFooter,
        WindowResult::NoMore => DataAction::Done,
        WindowResult::Incomplete => DataAction::Deferred,
        WindowResult::Invalid | WindowResult::Aborted => DataAction::Done,
    }
}

/// Whether the message has no body at all, so the initial `HEADERS`
/// frame alone can carry `END_STREAM` (spec §4.2 egress step 2,
/// "lookahead on stream data returns `NO_MORE`").
pub fn is_bodyless(handle: &mut MessageHandle) -> bool {
    matches!(handle.poll_window(1), WindowResult::NoMore)
}

/// Build the headers for an egress exchange from a delivery's
/// application-properties (spec §4.2 egress step 1).
pub fn headers_for_delivery(app_properties: &[(String, String)]) -> http::HeaderMap {
    app_properties_to_headers(app_properties)
}

/// Map a settled disposition to what the egress side should do on the
/// wire (spec §4.2 point 5, §7 disposition table).
pub fn disposition_action(
    outcome: Outcome,
    direction: Direction,
    resend_released: bool,
) -> Option<HttpDisposition> {
    map_disposition(outcome, direction, resend_released)
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_message::MessageContent;

    #[test]
    fn zero_write_capacity_always_defers() {
        let content = MessageContent::new();
        let mut handle = MessageHandle::new(content);
        assert_eq!(poll_data(&mut handle, 0), DataAction::Deferred);
    }

    #[test]
    fn bodyless_message_reports_no_more_immediately() {
        let content = MessageContent::new();
        content.mark_receive_complete();
        let mut handle = MessageHandle::new(content);
        assert!(is_bodyless(&mut handle));
    }

    #[test]
    fn releases_body_once_the_parser_has_reached_it() {
        let content = MessageContent::new();
        content.receive(b"payload");
        content.mark_receive_complete();
        let locator = router_message::FieldLocator::new(Bytes::from_static(b"payload"), 0, 7, 0, 0);
        content.store_locator(Section::Body, locator);

        let mut handle = MessageHandle::new(content);
        match poll_data(&mut handle, 1024) {
            DataAction::Send { chunk, end_stream, .. } => {
                assert_eq!(&chunk[..], b"payload");
                assert!(end_stream);
            }
            other => panic!("expected Send, got {other:?}"),
        }
    }

    #[test]
    fn headers_for_delivery_drops_pseudo_headers() {
        let props = vec![
            (":status".to_string(), "200".to_string()),
            ("content-type".to_string(), "text/plain".to_string()),
        ];
        let headers = headers_for_delivery(&props);
        assert!(headers.get(":status").is_none());
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }
}
