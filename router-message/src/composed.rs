//! Append-only builder for synthesizing AMQP performatives as buffer
//! lists (spec §4.1 "Compose"). Used on ingress to write the
//! router-annotations section the adapter attaches, and on egress paths
//! that need to rebuild a section rather than forward it unchanged.

use crate::buffer::BufferList;
use bytes::{Bytes, BytesMut};
use router_proto::amqp;

/// Accumulates an encoded section (or list/map element) into a single
/// scratch buffer. Nothing is copied twice: [`Self::finish`] freezes the
/// scratch directly into the [`Bytes`] the resulting [`BufferList`] holds.
#[derive(Debug, Default)]
pub struct ComposedField {
    scratch: BytesMut,
}

impl ComposedField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, descriptor: u8) -> &mut Self {
        amqp::encode_section_header(&mut self.scratch, descriptor);
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        amqp::encode_string(&mut self.scratch, s);
        self
    }

    pub fn symbol(&mut self, s: &str) -> &mut Self {
        amqp::encode_symbol(&mut self.scratch, s);
        self
    }

    pub fn binary(&mut self, data: &[u8]) -> &mut Self {
        amqp::encode_binary(&mut self.scratch, data);
        self
    }

    pub fn null(&mut self) -> &mut Self {
        amqp::encode_null(&mut self.scratch);
        self
    }

    pub fn boolean(&mut self, v: bool) -> &mut Self {
        amqp::encode_bool(&mut self.scratch, v);
        self
    }

    pub fn smallulong(&mut self, v: u8) -> &mut Self {
        amqp::encode_smalluint_as_ulong(&mut self.scratch, v);
        self
    }

    pub fn list8(&mut self, elements: &[Bytes]) -> &mut Self {
        amqp::encode_list8(&mut self.scratch, elements);
        self
    }

    pub fn str_map(&mut self, entries: &[(String, String)]) -> &mut Self {
        amqp::encode_str_map(&mut self.scratch, entries);
        self
    }

    /// Freeze what has been written so far as a standalone element and
    /// reset the builder, so the caller can collect a handful of
    /// `take_element()` results and hand them to [`Self::list8`] as a
    /// list's fields.
    pub fn take_element(&mut self) -> Bytes {
        std::mem::take(&mut self.scratch).freeze()
    }

    /// Freeze the builder into a single-chunk [`BufferList`] ready to be
    /// appended onto a message's chain.
    pub fn finish(self) -> BufferList {
        let mut out = BufferList::new();
        if !self.scratch.is_empty() {
            out.push_back(self.scratch.freeze());
        }
        out
    }
}
