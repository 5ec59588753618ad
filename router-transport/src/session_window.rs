//! Session-level (Q3) outbound flow control (spec §4.1 "Session-level
//! flow control (Q3)"): tracks outgoing-byte buildup shared across every
//! stream on one connection's session, and stops sending on all of them
//! once it crosses `Q3_UPPER`.
//!
//! Mirrors [`router_message::content`]'s Q2 tracker in shape (a small
//! `Inner` guarded by one lock, a pinned upper/lower pair of thresholds)
//! but counts queued outgoing bytes rather than resident buffers, and
//! lives on the connection rather than on a message.

use crate::config::{Q3_LOWER, Q3_UPPER};
use parking_lot::Mutex;

/// Result of enqueuing or draining outgoing bytes: whether Q3 flipped
/// state as a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Q3Signal {
    Unchanged,
    BecameBlocked,
    BecameUnblocked,
}

#[derive(Debug, Default)]
struct Inner {
    outgoing_bytes: usize,
    blocked: bool,
}

/// One connection's session-level outbound backlog.
#[derive(Debug, Default)]
pub struct SessionWindow {
    inner: Mutex<Inner>,
}

impl SessionWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.lock().blocked
    }

    pub fn outgoing_bytes(&self) -> usize {
        self.inner.lock().outgoing_bytes
    }

    /// Record that `n` more outgoing bytes have been queued for send on
    /// one of this session's streams.
    pub fn enqueue(&self, n: usize) -> Q3Signal {
        let mut inner = self.inner.lock();
        inner.outgoing_bytes += n;
        if !inner.blocked && inner.outgoing_bytes >= Q3_UPPER {
            inner.blocked = true;
            return Q3Signal::BecameBlocked;
        }
        Q3Signal::Unchanged
    }

    /// Record that `n` outgoing bytes were actually written to the wire
    /// and are no longer part of the session's buildup.
    pub fn drain(&self, n: usize) -> Q3Signal {
        let mut inner = self.inner.lock();
        inner.outgoing_bytes = inner.outgoing_bytes.saturating_sub(n);
        if inner.blocked && inner.outgoing_bytes <= Q3_LOWER {
            inner.blocked = false;
            return Q3Signal::BecameUnblocked;
        }
        Q3Signal::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_at_upper_and_unblocks_at_lower() {
        let q3 = SessionWindow::new();
        assert_eq!(q3.enqueue(Q3_UPPER - 1), Q3Signal::Unchanged);
        assert_eq!(q3.enqueue(1), Q3Signal::BecameBlocked);
        assert!(q3.is_blocked());

        assert_eq!(q3.drain(Q3_UPPER - Q3_LOWER - 1), Q3Signal::Unchanged);
        assert_eq!(q3.drain(1), Q3Signal::BecameUnblocked);
        assert!(!q3.is_blocked());
    }

    #[test]
    fn drain_past_zero_saturates() {
        let q3 = SessionWindow::new();
        q3.enqueue(10);
        assert_eq!(q3.drain(100), Q3Signal::Unchanged);
        assert_eq!(q3.outgoing_bytes(), 0);
    }
}
