//! Ingress pipeline: an HTTP/2 peer is the client, the router accepts
//! the stream and turns it into an incoming router-core delivery (spec
//! §4.2 "Ingress").

use crate::stream::{StreamRecord, StreamRole};
use crate::translate::ingress_headers_to_app_properties;
use bytes::Bytes;
use h2::RecvStream;
use h2::server::SendResponse;
use http::Request;
use router_message::{ComposedField, MessageContent, Q2Signal, Section};
use router_proto::amqp::descriptor;
use router_proto::link::LinkSource;
use router_proto::{Direction, LinkHandle};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Accepted but not yet routed: headers have produced an
/// application-properties prefix and a content, but the adapter is
/// waiting for link credit before the first delivery can go out (spec
/// §4.2 point 3: "If no link credit yet, hold the delivery").
pub struct PendingIngress {
    pub content: Arc<MessageContent>,
    pub app_properties: Vec<(String, String)>,
    pub subject: String,
}

/// Compose the header+properties+app-properties prefix for a newly
/// opened ingress stream (spec §4.2 points 1-2): the request's
/// `:method`/path/headers become a Properties section (subject) and an
/// ApplicationProperties section, both written into the content via
/// [`MessageContent::compose`] so the parse cursor actually advances —
/// without this, `egress::poll_data`'s `parse_reached(Section::Body)`
/// gate can never open for a message this adapter produced itself.
pub fn open_ingress_stream<L>(
    links: &L,
    req: &Request<RecvStream>,
    target: &str,
    name: &str,
) -> Result<(StreamRecord, PendingIngress, LinkHandle), router_error::BoxError>
where
    L: LinkSource<Message = Arc<MessageContent>>,
{
    let parsed = ingress_headers_to_app_properties(req);
    let content = MessageContent::new();

    let mut properties = ComposedField::new();
    properties.section(descriptor::PROPERTIES);
    properties.string(&parsed.subject);

    let mut app_properties = ComposedField::new();
    app_properties.section(descriptor::APPLICATION_PROPERTIES);
    app_properties.str_map(&parsed.app_properties);

    content.compose(vec![
        (Section::Properties, properties.finish()),
        (Section::ApplicationProperties, app_properties.finish()),
    ]);

    let link = links.link_first_attach(Direction::Incoming, "http2", target, name)?;

    let mut record = StreamRecord::new(StreamRole::Ingress);
    record.link = Some(link);
    record.content = Some(content.clone());
    record.http_method = Some(req.method().clone());
    record.entire_header_arrived = true;
    record.header_and_props_composed = true;

    debug!(subject = %parsed.subject, path = ?parsed.path, "ingress stream opened");

    Ok((
        record,
        PendingIngress {
            content,
            app_properties: parsed.app_properties,
            subject: parsed.subject,
        },
        link,
    ))
}

/// Route a pending ingress delivery once link credit is known to be
/// available. Returns the delivery id the router-core assigned, or the
/// link-deliver error if routing failed outright.
pub fn route_pending<L>(
    links: &L,
    link: LinkHandle,
    content: Arc<MessageContent>,
) -> Result<router_proto::DeliveryId, router_error::BoxError>
where
    L: LinkSource<Message = Arc<MessageContent>>,
{
    links.link_deliver(link, content)
}

/// Feed one HTTP/2 `DATA` chunk into the message body, returning the Q2
/// signal so the caller can stop/resume reading from the connection
/// (spec §4.2 point 4). The first chunk also advances the parse cursor
/// to `Body`, since body bytes are tracked through the chain itself
/// rather than through a located field.
pub fn append_data(content: &MessageContent, chunk: &[u8], record: &mut StreamRecord) -> Q2Signal {
    record.bytes_in += chunk.len() as u64;
    trace!(len = chunk.len(), "ingress data appended");
    let signal = content.receive(chunk);
    content.mark_body_started();
    record.body_data_added_to_msg = true;
    signal
}

/// Mark the message complete once the HTTP/2 stream reports
/// `END_STREAM` (spec §4.2 point 5).
pub fn receive_complete(content: &MessageContent, record: &mut StreamRecord) {
    content.mark_body_started();
    content.mark_receive_complete();
    record.state = record.state.on_half_close();
}

/// Forced closure from the peer (`RST_STREAM`): the stream is marked
/// aborted and moves straight to `FullyClosed` regardless of prior state
/// (spec §4.3 "Failure semantics").
pub fn abort_stream(content: &MessageContent, record: &mut StreamRecord) {
    warn!("ingress stream reset by peer; aborting in-flight message");
    content.abort();
    record.force_close();
}

/// The trailing-HEADERS case: a footer arrived after the body. Returned
/// to the caller as the raw field map so it can be composed with
/// `router_message::ComposedField` and extended onto the content.
pub fn footer_from_trailers(trailers: &http::HeaderMap) -> Vec<(String, String)> {
    trailers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Compose trailing `HEADERS` into a Footer section and extend the
/// content with it (spec §4.2 "Ingress", trailing-headers case). A
/// no-op if the peer sent no trailers worth keeping.
pub fn apply_footer(content: &MessageContent, trailers: &http::HeaderMap, record: &mut StreamRecord) {
    let entries = footer_from_trailers(trailers);
    if entries.is_empty() {
        return;
    }
    let mut footer = ComposedField::new();
    footer.section(descriptor::FOOTER);
    footer.str_map(&entries);
    content.extend(Section::Footer, footer.finish());
    record.entire_footer_arrived = true;
    record.use_footer_properties = true;
}

/// Type alias documenting the `SendResponse` side the adapter drives once
/// a response delivery settles for this stream.
pub type IngressResponder = SendResponse<Bytes>;

#[cfg(test)]
mod tests {
    use super::*;
    use router_proto::link::mock::MockLinkSource;

    #[test]
    fn attaching_a_link_and_translating_headers_succeed_independently() {
        // RecvStream can't be constructed outside an active h2 connection,
        // so this exercises open_ingress_stream's two building blocks
        // directly rather than the function itself.
        let links: MockLinkSource<Arc<MessageContent>> = MockLinkSource::default();
        let req = Request::builder()
            .method("POST")
            .uri("https://example.test/widgets")
            .body(())
            .expect("valid request");
        let parsed = ingress_headers_to_app_properties(&req);
        assert_eq!(parsed.subject, "POST");

        let link = links
            .link_first_attach(Direction::Incoming, "http2", "widgets", "stream-1")
            .expect("attach succeeds");
        assert_eq!(link.0, 0);
    }

    #[test]
    fn footer_from_trailers_collects_entries() {
        let mut trailers = http::HeaderMap::new();
        trailers.insert("x-checksum", "abc123".parse().unwrap());
        let footer = footer_from_trailers(&trailers);
        assert_eq!(footer, vec![("x-checksum".to_string(), "abc123".to_string())]);
    }

    #[test]
    fn composing_properties_and_app_properties_advances_the_parse_cursor() {
        let content = MessageContent::new();
        let mut properties = ComposedField::new();
        properties.string("POST");
        let mut app_properties = ComposedField::new();
        app_properties.str_map(&[(":path".to_string(), "/widgets".to_string())]);

        content.compose(vec![
            (Section::Properties, properties.finish()),
            (Section::ApplicationProperties, app_properties.finish()),
        ]);

        assert!(content.parse_reached(Section::ApplicationProperties));
        assert!(!content.parse_reached(Section::Body));
    }

    #[test]
    fn append_data_advances_the_cursor_to_body_so_egress_can_release_it() {
        let content = MessageContent::new();
        let mut record = StreamRecord::new(StreamRole::Ingress);
        append_data(&content, b"payload", &mut record);

        assert!(content.parse_reached(Section::Body));
        assert!(record.body_data_added_to_msg);
        assert_eq!(record.bytes_in, 7);
    }

    #[test]
    fn apply_footer_extends_the_content_and_marks_the_record() {
        let content = MessageContent::new();
        content.receive(b"payload");
        let mut record = StreamRecord::new(StreamRole::Ingress);

        let mut trailers = http::HeaderMap::new();
        trailers.insert("x-checksum", "abc123".parse().unwrap());
        apply_footer(&content, &trailers, &mut record);

        assert!(content.parse_reached(Section::Footer));
        assert!(record.entire_footer_arrived);
        assert!(content.locator(Section::Footer).is_some());
    }

    #[test]
    fn apply_footer_is_a_no_op_without_trailers() {
        let content = MessageContent::new();
        let mut record = StreamRecord::new(StreamRole::Ingress);
        apply_footer(&content, &http::HeaderMap::new(), &mut record);
        assert!(!record.entire_footer_arrived);
    }
}
