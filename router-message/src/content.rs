//! The shared, reference-counted message content (spec §3 "Message
//! content", §4.1 Q2, §5 lock order).
//!
//! A single [`MessageContent`] is produced by one incoming link and may
//! be read by one or more outgoing links (fan-out multicast shares the
//! same content; unicast cut-through is the common case of exactly one
//! reader). The buffer chain is append-only and its frozen [`Bytes`]
//! chunks are cheap to share, so readers never copy bytes the producer
//! already wrote — they only copy when a read straddles a chunk
//! boundary.
//!
//! Three locks guard independent concerns and must always be taken in
//! this order if more than one is needed at once: the content lock
//! (chain, locators, Q2 state), then the producer-activation lock, then
//! the consumer-activation lock. Nothing in this crate ever needs all
//! three; the order is recorded here because `router-transport` adds a
//! fourth (the server-activation lock) outside of it.

use crate::buffer::{Buffer, BufferList, DEFAULT_BUFFER_CAPACITY};
use crate::cut_through::CutThroughRing;
use crate::field::{FieldLocator, ParseCursor, Section};
use crate::weak::SafeHandle;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Upper buffer-count threshold: the producing link is asked to stop
/// reading once the chain holds this many buffers.
pub const Q2_UPPER: usize = 64;
/// Lower buffer-count threshold: the producing link is told it may
/// resume once the chain has drained down to this many buffers.
pub const Q2_LOWER: usize = 32;

/// Whether the content is currently telling its producer to keep
/// reading or to pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Q2State {
    Open,
    Blocked,
}

/// Result of appending data: whether Q2 flipped state as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Q2Signal {
    Unchanged,
    BecameBlocked,
    BecameUnblocked,
}

/// Result of [`MessageContent::check_depth`] (spec §4.1 "Depth check").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthCheck {
    /// The parser has reached this section.
    Ok,
    /// Still receiving; the section may yet arrive.
    Incomplete,
    /// Receiving finished (or the message was aborted) without ever
    /// reaching this section.
    Invalid,
}

struct Inner {
    chain: BufferList,
    pending: Option<Buffer>,
    locators: HashMap<Section, FieldLocator>,
    parse_cursor: ParseCursor,
    q2_state: Q2State,
    q2_disabled: bool,
    receive_complete: bool,
    aborted: bool,
    total_bytes: usize,
    /// Cumulative bytes popped off the front of `chain`. `chain`'s first
    /// resident buffer starts at this absolute offset, not zero.
    freed_bytes: usize,
    next_consumer_id: u64,
    /// Each live consumer's reported read position; a buffer is only
    /// freed once it lies before the minimum of these (spec §4.1: "freed
    /// ... only when referenced by no live window and lies strictly
    /// before the current send cursor of every handle").
    consumer_floors: HashMap<u64, usize>,
}

impl Inner {
    fn update_q2(&mut self) -> Q2Signal {
        let count = self.chain.len();
        match self.q2_state {
            Q2State::Open if !self.q2_disabled && count >= Q2_UPPER => {
                self.q2_state = Q2State::Blocked;
                Q2Signal::BecameBlocked
            }
            Q2State::Blocked if count <= Q2_LOWER => {
                self.q2_state = Q2State::Open;
                Q2Signal::BecameUnblocked
            }
            _ => Q2Signal::Unchanged,
        }
    }

    /// Append a pre-composed field's buffers onto the chain and, for a
    /// single-chunk field, store a locator over it (spec §4.1 "Compose",
    /// "Extend").
    fn ingest_field(&mut self, section: Section, field: BufferList) {
        if field.is_empty() {
            self.parse_cursor.advance_to(section);
            return;
        }
        self.total_bytes += field.total_bytes();
        let locator_chunk = field.front().cloned();
        self.chain.append(field);
        if let Some(chunk) = locator_chunk {
            let len = chunk.len();
            self.locators.insert(section, FieldLocator::new(chunk, 0, len, 0, 0));
        }
        self.parse_cursor.advance_to(section);
    }

    /// Drop every buffer that now lies entirely before the slowest live
    /// consumer's read position.
    fn reclaim(&mut self) -> Q2Signal {
        let Some(&floor) = self.consumer_floors.values().min() else {
            return Q2Signal::Unchanged;
        };
        while self.freed_bytes < floor {
            let Some(front_len) = self.chain.front().map(|b| b.len()) else {
                break;
            };
            if self.freed_bytes + front_len > floor {
                break;
            }
            self.chain.pop_front();
            self.freed_bytes += front_len;
        }
        self.update_q2()
    }
}

/// The shared body of a message in flight through the adapter.
pub struct MessageContent {
    inner: Mutex<Inner>,
    producer_activation: Mutex<Option<SafeHandle>>,
    consumer_activation: Mutex<Option<SafeHandle>>,
    cut_through: Mutex<CutThroughRing>,
}

impl Default for MessageContent {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                chain: BufferList::new(),
                pending: None,
                locators: HashMap::new(),
                parse_cursor: ParseCursor::new(),
                q2_state: Q2State::Open,
                q2_disabled: false,
                receive_complete: false,
                aborted: false,
                total_bytes: 0,
                freed_bytes: 0,
                next_consumer_id: 0,
                consumer_floors: HashMap::new(),
            }),
            producer_activation: Mutex::new(None),
            consumer_activation: Mutex::new(None),
            cut_through: Mutex::new(CutThroughRing::new()),
        }
    }
}

impl MessageContent {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Append incoming bytes, filling (and flushing, once full) the
    /// pending buffer into the chain. Returns whether Q2 flipped state.
    pub fn receive(&self, src: &[u8]) -> Q2Signal {
        let mut inner = self.inner.lock();
        let mut offset = 0;
        while offset < src.len() {
            if inner.pending.is_none() {
                inner.pending = Some(Buffer::with_capacity(DEFAULT_BUFFER_CAPACITY));
            }
            let pending = inner.pending.as_mut().expect("just inserted");
            let written = pending.append(&src[offset..]);
            offset += written;
            if pending.is_full() {
                let full = inner.pending.take().expect("just borrowed");
                inner.chain.push_back(full.freeze());
            }
        }
        inner.total_bytes += src.len();
        inner.update_q2()
    }

    /// Flush whatever has been partially written into the pending buffer
    /// into the chain, so readers can see it even though it never
    /// reached capacity. Called once the producer has no more to send.
    pub fn flush_pending(&self) {
        let mut inner = self.inner.lock();
        if let Some(buf) = inner.pending.take() {
            if buf.size() > 0 {
                inner.chain.push_back(buf.freeze());
            }
        }
    }

    pub fn mark_receive_complete(&self) {
        self.flush_pending();
        self.inner.lock().receive_complete = true;
    }

    pub fn receive_complete(&self) -> bool {
        self.inner.lock().receive_complete
    }

    pub fn abort(&self) {
        self.inner.lock().aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.lock().aborted
    }

    pub fn buffer_count(&self) -> usize {
        self.inner.lock().chain.len()
    }

    pub fn q2_state(&self) -> Q2State {
        self.inner.lock().q2_state
    }

    /// Total body bytes made visible so far, across the whole chain.
    /// Unaffected by reclamation: this is cumulative, not a measure of
    /// what is currently resident.
    pub fn total_available_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }

    pub fn store_locator(&self, section: Section, locator: FieldLocator) {
        let mut inner = self.inner.lock();
        inner.parse_cursor.advance_to(section);
        inner.locators.insert(section, locator);
    }

    pub fn locator(&self, section: Section) -> Option<FieldLocator> {
        self.inner.lock().locators.get(&section).cloned()
    }

    pub fn parse_reached(&self, section: Section) -> bool {
        self.inner.lock().parse_cursor.reached(section)
    }

    /// Build a message from one or several pre-composed field builders,
    /// in order (spec §4.1 "Compose"). Each field is appended to the
    /// chain, located (for single-chunk fields), and advances the parse
    /// cursor; this is the ingress header/properties/app-properties
    /// prefix path, not the streamed body.
    pub fn compose(&self, fields: Vec<(Section, BufferList)>) -> Q2Signal {
        let mut inner = self.inner.lock();
        for (section, field) in fields {
            inner.ingest_field(section, field);
        }
        inner.update_q2()
    }

    /// Append one more composed field to a message that is still
    /// receiving — the trailing-footer case (spec §4.1 "Extend").
    /// Returns the chain's current buffer count.
    pub fn extend(&self, section: Section, field: BufferList) -> usize {
        let mut inner = self.inner.lock();
        inner.ingest_field(section, field);
        inner.update_q2();
        inner.chain.len()
    }

    /// Advance the parse cursor straight to `Body` without a locator:
    /// body bytes are tracked through the buffer chain itself as
    /// `receive` appends them, not through a located field (spec §4.1
    /// "incremental parse").
    pub fn mark_body_started(&self) {
        self.inner.lock().parse_cursor.advance_to(Section::Body);
    }

    /// Whether the parser has reached `section`, is still short of it
    /// with more data expected, or will now never reach it (spec §4.1
    /// "Depth check").
    pub fn check_depth(&self, section: Section) -> DepthCheck {
        let inner = self.inner.lock();
        if inner.aborted {
            return DepthCheck::Invalid;
        }
        if inner.parse_cursor.reached(section) {
            DepthCheck::Ok
        } else if inner.receive_complete {
            DepthCheck::Invalid
        } else {
            DepthCheck::Incomplete
        }
    }

    /// Suppress Q2 for the rest of this message's life; if currently
    /// blocked, unblock immediately (spec §4.1: "disable_q2_holdoff
    /// suppresses the mechanism and, if currently blocked, triggers the
    /// unblocked handler immediately"). The caller is responsible for
    /// acting on a returned `BecameUnblocked` the same way it would for
    /// one observed from `receive`/`report_consumer_position`.
    pub fn disable_q2_holdoff(&self) -> Q2Signal {
        let mut inner = self.inner.lock();
        inner.q2_disabled = true;
        if inner.q2_state == Q2State::Blocked {
            inner.q2_state = Q2State::Open;
            Q2Signal::BecameUnblocked
        } else {
            Q2Signal::Unchanged
        }
    }

    pub fn q2_holdoff_disabled(&self) -> bool {
        self.inner.lock().q2_disabled
    }

    /// Read `len` bytes starting at absolute offset `start` in the body,
    /// coalescing across chunk boundaries. Returns `None` if the range
    /// isn't (yet) fully available, or has already been reclaimed.
    pub fn read_range(&self, start: usize, len: usize) -> Option<Bytes> {
        if len == 0 {
            return Some(Bytes::new());
        }
        let inner = self.inner.lock();
        if start < inner.freed_bytes {
            return None;
        }
        let end = start + len;
        let mut pos = inner.freed_bytes;
        let mut out: Option<BytesMut> = None;
        for chunk in inner.chain.iter() {
            let chunk_start = pos;
            let chunk_end = pos + chunk.len();
            pos = chunk_end;
            if chunk_end <= start {
                continue;
            }
            if chunk_start >= end {
                break;
            }
            let lo = start.max(chunk_start) - chunk_start;
            let hi = end.min(chunk_end) - chunk_start;
            match &mut out {
                None if lo == 0 && hi == chunk.len() && chunk_end >= end => {
                    return Some(chunk.slice(lo..hi));
                }
                None => {
                    let mut b = BytesMut::with_capacity(len);
                    b.extend_from_slice(&chunk[lo..hi]);
                    out = Some(b);
                }
                Some(b) => b.extend_from_slice(&chunk[lo..hi]),
            }
        }
        if pos < end {
            return None;
        }
        out.map(BytesMut::freeze)
    }

    /// Register a new consumer (one [`crate::handle::MessageHandle`])
    /// and return the id it should report its read position under.
    pub fn register_consumer(&self) -> u64 {
        let mut inner = self.inner.lock();
        let id = inner.next_consumer_id;
        inner.next_consumer_id += 1;
        inner.consumer_floors.insert(id, 0);
        id
    }

    /// A consumer is going away; drop its floor and reclaim whatever
    /// that frees up.
    pub fn unregister_consumer(&self, id: u64) -> Q2Signal {
        let mut inner = self.inner.lock();
        inner.consumer_floors.remove(&id);
        inner.reclaim()
    }

    /// Tell the content that consumer `id` will never read before
    /// `position` again, and reclaim any buffer now unreferenced by
    /// every live consumer (spec §4.1 "the content frees a buffer only
    /// when ... it lies strictly before the current send cursor of
    /// every handle"). Returns the Q2 signal observed while reclaiming.
    pub fn report_consumer_position(&self, id: u64, position: usize) -> Q2Signal {
        let mut inner = self.inner.lock();
        inner.consumer_floors.insert(id, position);
        inner.reclaim()
    }

    pub fn set_producer_activation(&self, handle: SafeHandle) {
        *self.producer_activation.lock() = Some(handle);
    }

    pub fn producer_activation(&self) -> Option<SafeHandle> {
        *self.producer_activation.lock()
    }

    pub fn clear_producer_activation(&self) {
        *self.producer_activation.lock() = None;
    }

    pub fn set_consumer_activation(&self, handle: SafeHandle) {
        *self.consumer_activation.lock() = Some(handle);
    }

    pub fn consumer_activation(&self) -> Option<SafeHandle> {
        *self.consumer_activation.lock()
    }

    pub fn clear_consumer_activation(&self) {
        *self.consumer_activation.lock() = None;
    }

    pub fn cut_through_produce(&self, chunk: BufferList) -> crate::cut_through::ProduceResult {
        self.cut_through.lock().produce(chunk)
    }

    pub fn cut_through_consume(&self) -> Option<BufferList> {
        self.cut_through.lock().consume()
    }

    pub fn cut_through_resume_from_stalled(&self) -> bool {
        self.cut_through.lock().resume_from_stalled()
    }
}
