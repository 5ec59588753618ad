//! Fixed-size octet buffers and the ordered chain that links them into a
//! single byte stream (spec §3, §4.1).

use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;

/// Default backing capacity for a freshly allocated buffer. The real
/// system tunes this per pool; a single constant is enough here since Q2
/// accounting only cares about buffer *count*, not their size (spec
/// §9 "Per-type slab pools").
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// A fixed-capacity octet buffer with a write cursor. Once [`Buffer::freeze`]
/// is called the buffer becomes an immutable, cheaply cloned [`Bytes`] and
/// is never rewritten again (spec §3 invariant: "Bytes appended ... never
/// rewritten").
#[derive(Debug)]
pub struct Buffer {
    data: BytesMut,
    capacity: usize,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.data.len())
    }

    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    /// Append as many bytes from `src` as fit; returns the number
    /// actually written. The caller is responsible for re-queuing the
    /// remainder into a fresh buffer (`receive`, spec §4.1).
    pub fn append(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.remaining_capacity());
        self.data.extend_from_slice(&src[..n]);
        n
    }

    /// Random-offset read within the written portion of the buffer.
    pub fn read_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.data.get(offset..offset + len)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the buffer into an immutable, refcounted [`Bytes`] for
    /// linking into a [`BufferList`].
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }
}

/// An ordered chain of frozen buffers with O(1) push/pop at both ends.
#[derive(Debug, Default, Clone)]
pub struct BufferList {
    buffers: VecDeque<Bytes>,
}

impl BufferList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, buf: Bytes) {
        self.buffers.push_back(buf);
    }

    pub fn push_front(&mut self, buf: Bytes) {
        self.buffers.push_front(buf);
    }

    pub fn pop_front(&mut self) -> Option<Bytes> {
        self.buffers.pop_front()
    }

    pub fn front(&self) -> Option<&Bytes> {
        self.buffers.front()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Number of buffers in the list (what Q2's `Q2_UPPER`/`Q2_LOWER`
    /// thresholds count, spec §4.1).
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn total_bytes(&self) -> usize {
        self.buffers.iter().map(|b| b.len()).sum()
    }

    /// Move all buffers from `other` onto the end of `self`, in order
    /// (used when the content takes ownership of a composed-field
    /// builder's buffers, spec §4.1 "Compose").
    pub fn append(&mut self, mut other: BufferList) {
        self.buffers.append(&mut other.buffers);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        self.buffers.iter()
    }
}
