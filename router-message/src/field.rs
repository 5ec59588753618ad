//! Zero-copy field locators into a message's buffer chain, and the parse
//! cursor that tracks how far an incoming stream has been decoded (spec
//! §3 "Field locator", §4.1 "incremental parse").
//!
//! A locator never copies section bytes out of the chain: it keeps a
//! cloned (refcounted) [`Bytes`] handle on the buffer the field was found
//! in, plus the byte range within it. Cloning a `Bytes` only bumps a
//! refcount, so locators are cheap to store per message even before the
//! section they name has actually been parsed.

use bytes::Bytes;
use router_proto::amqp::descriptor;

/// The AMQP sections the adapter distinguishes while parsing an incoming
/// stream, in wire order. Ordering matters: [`ParseCursor::reached`]
/// compares variants positionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Header,
    DeliveryAnnotations,
    MessageAnnotations,
    Properties,
    ApplicationProperties,
    RouterAnnotations,
    Body,
    Footer,
}

impl Section {
    /// The section descriptor code this variant corresponds to (spec §6,
    /// `router-proto::amqp::descriptor`).
    pub fn descriptor(self) -> u8 {
        match self {
            Section::Header => descriptor::HEADER,
            Section::DeliveryAnnotations => descriptor::DELIVERY_ANNOTATIONS,
            Section::MessageAnnotations => descriptor::MESSAGE_ANNOTATIONS,
            Section::Properties => descriptor::PROPERTIES,
            Section::ApplicationProperties => descriptor::APPLICATION_PROPERTIES,
            Section::RouterAnnotations => descriptor::ROUTER_ANNOTATIONS,
            Section::Body => descriptor::DATA,
            Section::Footer => descriptor::FOOTER,
        }
    }

    /// The section matching a descriptor code read off the wire, if any.
    pub fn from_descriptor(d: u8) -> Option<Section> {
        match d {
            descriptor::HEADER => Some(Section::Header),
            descriptor::DELIVERY_ANNOTATIONS => Some(Section::DeliveryAnnotations),
            descriptor::MESSAGE_ANNOTATIONS => Some(Section::MessageAnnotations),
            descriptor::PROPERTIES => Some(Section::Properties),
            descriptor::APPLICATION_PROPERTIES => Some(Section::ApplicationProperties),
            descriptor::ROUTER_ANNOTATIONS => Some(Section::RouterAnnotations),
            descriptor::DATA => Some(Section::Body),
            descriptor::FOOTER => Some(Section::Footer),
            _ => None,
        }
    }
}

/// A reference to one field's bytes within a buffer that is (or will be)
/// part of a message's chain, plus enough of the wire encoding to
/// re-parse it lazily.
#[derive(Debug, Clone)]
pub struct FieldLocator {
    buffer: Bytes,
    offset: usize,
    length: usize,
    header_length: usize,
    type_tag: u8,
    parsed: bool,
}

impl FieldLocator {
    /// `buffer` is the frozen buffer the field's bytes live in; `offset`
    /// and `length` locate the field (constructor included) within it;
    /// `header_length` is the width of the type constructor prefix, and
    /// `type_tag` is the primitive type code read from it.
    pub fn new(buffer: Bytes, offset: usize, length: usize, header_length: usize, type_tag: u8) -> Self {
        Self {
            buffer,
            offset,
            length,
            header_length,
            type_tag,
            parsed: false,
        }
    }

    /// The field's full encoding, constructor included.
    pub fn raw(&self) -> &[u8] {
        &self.buffer[self.offset..self.offset + self.length]
    }

    /// The field's value bytes, constructor excluded.
    pub fn body(&self) -> &[u8] {
        &self.buffer[self.offset + self.header_length..self.offset + self.length]
    }

    pub fn type_tag(&self) -> u8 {
        self.type_tag
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Record that the caller has decoded this field's value; further
    /// lookups can skip straight to the cached value instead of
    /// re-reading `raw()`.
    pub fn mark_parsed(&mut self) {
        self.parsed = true;
    }
}

/// Tracks the deepest section an incoming stream's parser has reached,
/// so the cut-through fast path (spec §4.1) can start forwarding body
/// buffers before `Footer` has even arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseCursor {
    depth: Option<Section>,
}

impl ParseCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor to `section`. Parsing only ever moves forward
    /// through wire order; advancing to an earlier section than the
    /// current depth is a no-op.
    pub fn advance_to(&mut self, section: Section) {
        if self.depth.map(|d| section > d).unwrap_or(true) {
            self.depth = Some(section);
        }
    }

    /// Whether the parser has decoded at least through `section`.
    pub fn reached(&self, section: Section) -> bool {
        self.depth.map(|d| d >= section).unwrap_or(false)
    }

    pub fn depth(&self) -> Option<Section> {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_splits_header_from_body() {
        let buf = Bytes::from_static(b"\x53\x75XYZ");
        let loc = FieldLocator::new(buf, 0, 5, 2, router_proto::amqp::type_tag::SYM8);
        assert_eq!(loc.raw(), b"\x53\x75XYZ");
        assert_eq!(loc.body(), b"XYZ");
    }

    #[test]
    fn cursor_only_advances_forward() {
        let mut cursor = ParseCursor::new();
        cursor.advance_to(Section::Properties);
        assert!(cursor.reached(Section::Header));
        assert!(cursor.reached(Section::Properties));
        assert!(!cursor.reached(Section::Body));

        cursor.advance_to(Section::Header);
        assert_eq!(cursor.depth(), Some(Section::Properties));
    }

    #[test]
    fn section_descriptor_round_trips() {
        for section in [
            Section::Header,
            Section::DeliveryAnnotations,
            Section::MessageAnnotations,
            Section::Properties,
            Section::ApplicationProperties,
            Section::RouterAnnotations,
            Section::Body,
            Section::Footer,
        ] {
            assert_eq!(Section::from_descriptor(section.descriptor()), Some(section));
        }
    }
}
