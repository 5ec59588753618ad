//! The cut-through unicast fast path: a small bounded ring of buffer-list
//! slots that lets the adapter forward a streaming delivery's body to its
//! single consumer without waiting for the whole message to land (spec
//! §4.1 "Cut-through").
//!
//! The ring is deliberately much smaller than Q2's buffer budget —
//! cut-through only needs to smooth out scheduling jitter between
//! producer and consumer, not buffer a whole message.

use crate::buffer::BufferList;
use std::collections::VecDeque;

/// Number of buffer-list slots in the ring.
pub const RING_SLOTS: usize = 8;
/// Once the ring has drained to this many occupied slots after having
/// stalled, the producer is told to resume.
pub const RESUME_THRESHOLD: usize = 4;

/// Outcome of offering a chunk to the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProduceResult {
    /// The chunk was queued.
    Accepted,
    /// The ring is full; the producer must stop and wait for
    /// [`CutThroughRing::resume_from_stalled`] to report `true`.
    Stalled,
}

/// A fixed-capacity ring of pending chunks shared between one producing
/// link and one consuming link on the cut-through path.
#[derive(Debug, Default)]
pub struct CutThroughRing {
    slots: VecDeque<BufferList>,
    stalled: bool,
}

impl CutThroughRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Offer a chunk to the ring. Once full, the ring refuses further
    /// chunks and latches `stalled` until the consumer drains it back
    /// down to [`RESUME_THRESHOLD`].
    pub fn produce(&mut self, chunk: BufferList) -> ProduceResult {
        if self.slots.len() >= RING_SLOTS {
            self.stalled = true;
            return ProduceResult::Stalled;
        }
        self.slots.push_back(chunk);
        ProduceResult::Accepted
    }

    /// Take the oldest queued chunk, if any.
    pub fn consume(&mut self) -> Option<BufferList> {
        self.slots.pop_front()
    }

    /// Call after a [`Self::consume`]; returns `true` exactly once, the
    /// first time the ring has drained enough for the producer to be
    /// told to resume.
    pub fn resume_from_stalled(&mut self) -> bool {
        if self.stalled && self.slots.len() <= RESUME_THRESHOLD {
            self.stalled = false;
            true
        } else {
            false
        }
    }
}
