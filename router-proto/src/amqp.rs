//! The narrow AMQP 1.0 subset the adapter touches.
//!
//! Only the performatives and field encodings the router actually reads or
//! writes are implemented here (spec Non-goal: "implementing the full AMQP
//! 1.0 type system"). Each message section is framed as a described list or
//! map: a `0x00` constructor, a small-ulong descriptor naming the section,
//! then the section's encoded body.

use bytes::{BufMut, Bytes, BytesMut};

/// Smallulong descriptor codes for the sections the adapter populates.
/// These mirror the low byte of the real AMQP 1.0 section descriptors
/// (`amqp:header:list` = `0x70`, and so on).
pub mod descriptor {
    pub const HEADER: u8 = 0x70;
    pub const DELIVERY_ANNOTATIONS: u8 = 0x71;
    pub const MESSAGE_ANNOTATIONS: u8 = 0x72;
    pub const PROPERTIES: u8 = 0x73;
    pub const APPLICATION_PROPERTIES: u8 = 0x74;
    pub const DATA: u8 = 0x75;
    pub const FOOTER: u8 = 0x78;
    /// Private, router-to-router only section. Not a standard AMQP
    /// descriptor; consumed only by peer routers (spec §6, GLOSSARY).
    pub const ROUTER_ANNOTATIONS: u8 = 0xf0;
}

/// Primitive type constructors used by the subset above.
pub mod type_tag {
    pub const NULL: u8 = 0x40;
    pub const BOOL_TRUE: u8 = 0x41;
    pub const BOOL_FALSE: u8 = 0x42;
    pub const UBYTE: u8 = 0x50;
    pub const SMALLULONG: u8 = 0x53;
    pub const ULONG: u8 = 0x80;
    pub const LIST8: u8 = 0xc0;
    pub const MAP8: u8 = 0xc1;
    pub const STR8_UTF8: u8 = 0xa1;
    pub const STR32_UTF8: u8 = 0xb1;
    pub const SYM8: u8 = 0xa3;
    pub const SYM32: u8 = 0xb3;
    pub const BIN8: u8 = 0xa0;
    pub const BIN32: u8 = 0xb0;
    pub const DESCRIBED_CONSTRUCTOR: u8 = 0x00;
}

use type_tag as tt;

/// Encode a UTF-8 string with the shortest applicable constructor.
pub fn encode_string(buf: &mut BytesMut, s: &str) {
    let bytes = s.as_bytes();
    if bytes.len() <= u8::MAX as usize {
        buf.put_u8(tt::STR8_UTF8);
        buf.put_u8(bytes.len() as u8);
    } else {
        buf.put_u8(tt::STR32_UTF8);
        buf.put_u32(bytes.len() as u32);
    }
    buf.put_slice(bytes);
}

/// Encode a symbol (AMQP's ASCII-constrained interned string type).
pub fn encode_symbol(buf: &mut BytesMut, s: &str) {
    let bytes = s.as_bytes();
    if bytes.len() <= u8::MAX as usize {
        buf.put_u8(tt::SYM8);
        buf.put_u8(bytes.len() as u8);
    } else {
        buf.put_u8(tt::SYM32);
        buf.put_u32(bytes.len() as u32);
    }
    buf.put_slice(bytes);
}

/// Encode an opaque binary blob (used for `Data` section payloads).
pub fn encode_binary(buf: &mut BytesMut, data: &[u8]) {
    if data.len() <= u8::MAX as usize {
        buf.put_u8(tt::BIN8);
        buf.put_u8(data.len() as u8);
    } else {
        buf.put_u8(tt::BIN32);
        buf.put_u32(data.len() as u32);
    }
    buf.put_slice(data);
}

/// Encode `null`.
pub fn encode_null(buf: &mut BytesMut) {
    buf.put_u8(tt::NULL);
}

/// Encode a boolean.
pub fn encode_bool(buf: &mut BytesMut, v: bool) {
    buf.put_u8(if v { tt::BOOL_TRUE } else { tt::BOOL_FALSE });
}

/// Encode a small ulong (used for flags, ingress-mesh widths, descriptors).
pub fn encode_smalluint_as_ulong(buf: &mut BytesMut, v: u8) {
    buf.put_u8(tt::SMALLULONG);
    buf.put_u8(v);
}

/// Write a described-list or described-map section header: the `0x00`
/// constructor, the section's smallulong descriptor, then the caller's
/// already-encoded body (a list or map). Returns nothing; the caller
/// appends `body` immediately after calling this.
pub fn encode_section_header(buf: &mut BytesMut, descriptor: u8) {
    buf.put_u8(tt::DESCRIBED_CONSTRUCTOR);
    buf.put_u8(tt::SMALLULONG);
    buf.put_u8(descriptor);
}

/// Encode a compact list with up to 255 already-encoded element buffers.
pub fn encode_list8(buf: &mut BytesMut, elements: &[Bytes]) {
    let body_len: usize = elements.iter().map(|e| e.len()).sum::<usize>() + 1;
    buf.put_u8(tt::LIST8);
    buf.put_u8(body_len as u8);
    buf.put_u8(elements.len() as u8);
    for e in elements {
        buf.put_slice(e);
    }
}

/// Encode a compact `str -> str` map (used for application-properties,
/// footer, and message-annotations symbol maps approximated as strings).
pub fn encode_str_map(buf: &mut BytesMut, entries: &[(String, String)]) {
    let mut body = BytesMut::new();
    for (k, v) in entries {
        encode_symbol(&mut body, k);
        encode_string(&mut body, v);
    }
    if body.len() <= u8::MAX as usize {
        buf.put_u8(tt::MAP8);
        buf.put_u8((body.len() + 1) as u8);
        buf.put_u8((entries.len() * 2) as u8);
    } else {
        buf.put_u8(0xd1); // map32
        buf.put_u32((body.len() + 4) as u32);
        buf.put_u32((entries.len() * 2) as u32);
    }
    buf.extend_from_slice(&body);
}

/// Parsed descriptor of the section at the cursor, if the bytes so far
/// contain a complete constructor + descriptor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub descriptor: u8,
    /// Number of bytes consumed by the `0x00 0x53 <descriptor>` prefix.
    pub header_len: usize,
}

/// Attempt to read a described-section header at `data[offset..]`.
/// Returns `None` if there are not yet enough bytes to decide.
pub fn peek_section_header(data: &[u8], offset: usize) -> Option<SectionHeader> {
    let rest = data.get(offset..)?;
    if rest.len() < 3 {
        return None;
    }
    if rest[0] != tt::DESCRIBED_CONSTRUCTOR || rest[1] != tt::SMALLULONG {
        return None;
    }
    Some(SectionHeader {
        descriptor: rest[2],
        header_len: 3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips_through_short_form() {
        let mut buf = BytesMut::new();
        encode_string(&mut buf, "hello");
        assert_eq!(buf[0], tt::STR8_UTF8);
        assert_eq!(buf[1], 5);
        assert_eq!(&buf[2..], b"hello");
    }

    #[test]
    fn section_header_round_trips() {
        let mut buf = BytesMut::new();
        encode_section_header(&mut buf, descriptor::PROPERTIES);
        let hdr = peek_section_header(&buf, 0).expect("header present");
        assert_eq!(hdr.descriptor, descriptor::PROPERTIES);
        assert_eq!(hdr.header_len, 3);
    }

    #[test]
    fn section_header_is_none_on_short_input() {
        assert!(peek_section_header(&[0x00, 0x53], 0).is_none());
    }

    #[test]
    fn str_map_round_trip_counts() {
        let mut buf = BytesMut::new();
        encode_str_map(
            &mut buf,
            &[("a".into(), "1".into()), ("b".into(), "2".into())],
        );
        assert_eq!(buf[0], tt::MAP8);
    }
}
