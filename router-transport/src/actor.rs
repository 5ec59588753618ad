//! The connection actor's event loop (spec §4.3 "Connection actor event
//! loop"). This module owns the *decisions* the table in §4.3 describes;
//! actually performing I/O (granting buffers, driving the HTTP/2 codec,
//! talking to a [`crate::tls::TlsSession`]) is the caller's job, since
//! that caller is the one holding the raw connection.

use crate::session_window::{Q3Signal, SessionWindow};
use router_http2::StreamRecord;
use router_message::{MessageContent, Q2Signal};
use router_proto::Outcome;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

/// The raw-connection-level atomic flags a single-writer-or-CAS actor
/// needs (spec §5 "Atomic flags"). Only the subset this crate's event
/// loop itself consults is modeled here; per-message flags
/// (`receive-complete`, `aborted`, ...) live on `router-message` types.
#[derive(Debug, Default)]
pub struct ActorFlags {
    pub raw_close_read: AtomicBool,
    pub raw_close_write: AtomicBool,
    /// Set when Q2 transitioned to blocked; `READ` is a no-op while set.
    pub q2_blocked: AtomicBool,
    /// Set by the Q2 unblocked handler when it fires on a thread other
    /// than the actor's own; `WAKE` consumes it.
    pub q2_restart: AtomicBool,
}

/// What the `CONNECTED` event asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedOutcome {
    pub instantiate_tls: bool,
    pub grant_read_buffers: bool,
    pub drive_tls_handshake: bool,
}

/// The connection actor. Owns the stream table and the flags table;
/// does not own the raw connection, the HTTP/2 session, or the TLS
/// session — those are driven by the caller using the outcomes this
/// type returns.
pub struct ConnectionActor {
    pub flags: ActorFlags,
    pub is_egress: bool,
    pub q3: SessionWindow,
    streams: VecDeque<StreamRecord>,
}

impl ConnectionActor {
    pub fn new(is_egress: bool) -> Self {
        Self {
            flags: ActorFlags::default(),
            is_egress,
            q3: SessionWindow::new(),
            streams: VecDeque::new(),
        }
    }

    pub fn push_stream(&mut self, record: StreamRecord) {
        self.streams.push_back(record);
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn on_connected(&mut self, tls_required: bool, tls_has_output: bool) -> ConnectedOutcome {
        ConnectedOutcome {
            instantiate_tls: tls_required,
            grant_read_buffers: true,
            drive_tls_handshake: self.is_egress && tls_required && tls_has_output,
        }
    }

    /// `NEED_READ_BUFFERS`: grant unless the read side is already
    /// closed.
    pub fn on_need_read_buffers(&self) -> bool {
        !self.flags.raw_close_read.load(Ordering::Acquire)
    }

    /// `READ`: whether the caller should actually decrypt and feed the
    /// codec, or do nothing because Q2 is blocked.
    pub fn on_read(&self) -> bool {
        !self.flags.q2_blocked.load(Ordering::Acquire)
    }

    /// Apply a Q2 signal this connection observed on content it is
    /// itself producing into: pause or resume `READ` directly, same
    /// thread, no cross-thread wake needed (spec §4.1 Q2, §4.3 `READ`).
    /// A consumer-side `BecameUnblocked` observed on a *different*
    /// connection's content instead goes through
    /// `activation::wake_producer_on_unblock`.
    pub fn apply_q2_signal_locally(&self, signal: Q2Signal) {
        match signal {
            Q2Signal::BecameBlocked => self.flags.q2_blocked.store(true, Ordering::Release),
            Q2Signal::BecameUnblocked => self.flags.q2_blocked.store(false, Ordering::Release),
            Q2Signal::Unchanged => {}
        }
    }

    /// `READ`, ingress direction: feed one HTTP/2 DATA chunk into the
    /// stream's message content and apply the resulting Q2 transition to
    /// this connection's own flags. Returns the signal so a caller
    /// fanning this content out to other connections can still react
    /// further.
    pub fn on_ingress_data(
        &self,
        content: &MessageContent,
        chunk: &[u8],
        record: &mut StreamRecord,
    ) -> Q2Signal {
        let signal = router_http2::ingress::append_data(content, chunk, record);
        self.apply_q2_signal_locally(signal);
        signal
    }

    /// Whether this connection's session-level (Q3) outbound buildup
    /// allows sending more on any of its streams right now (spec §4.1
    /// "Session-level flow control (Q3)").
    pub fn may_send(&self) -> bool {
        !self.q3.is_blocked()
    }

    /// Record that `n` more outgoing bytes have been queued for send on
    /// one of this connection's streams. Returns whether Q3 just
    /// transitioned to blocked.
    pub fn enqueue_outgoing(&self, n: usize) -> bool {
        matches!(self.q3.enqueue(n), Q3Signal::BecameBlocked)
    }

    /// `WRITE_COMPLETED`: record the bytes actually written against Q3,
    /// then run `restart_streams`.
    pub fn on_write_completed(&mut self, bytes_written: usize, mut drive: impl FnMut(&mut StreamRecord)) {
        self.q3.drain(bytes_written);
        self.restart_streams(&mut drive);
    }

    /// `WAKE`: if a restart was requested, clear Q2 and report that the
    /// read path should run; the caller is still responsible for
    /// draining the router-core's work list unconditionally.
    pub fn on_wake(&mut self) -> bool {
        if self
            .flags
            .q2_restart
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.flags.q2_blocked.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// `CLOSED_READ` / `CLOSED_WRITE`: set the flag, clear Q2 if
    /// blocked, and report whether both sides are now closed (the
    /// caller should begin disconnect handling).
    pub fn on_closed_read(&mut self) -> bool {
        self.flags.raw_close_read.store(true, Ordering::Release);
        self.flags.q2_blocked.store(false, Ordering::Release);
        self.both_sides_closed()
    }

    pub fn on_closed_write(&mut self) -> bool {
        self.flags.raw_close_write.store(true, Ordering::Release);
        self.flags.q2_blocked.store(false, Ordering::Release);
        self.both_sides_closed()
    }

    fn both_sides_closed(&self) -> bool {
        self.flags.raw_close_read.load(Ordering::Acquire) && self.flags.raw_close_write.load(Ordering::Acquire)
    }

    /// `DISCONNECTED`: whether the caller should schedule the 2-second
    /// reconnect timer (egress only, and only if the connector isn't
    /// being deleted), and force-close every still-open stream.
    pub fn on_disconnected(&mut self, connector_being_deleted: bool) -> bool {
        for stream in self.streams.iter_mut() {
            if !stream.state.is_fully_closed() {
                stream.force_close();
            }
        }
        self.is_egress && !connector_being_deleted
    }

    /// Rotate the stream list's head to the tail for fairness, free any
    /// stream that is fully closed with its send complete, and invoke
    /// `drive` on every surviving stream whose outbound disposition
    /// hasn't reached `ACCEPTED` yet — unless Q3 is blocked, in which
    /// case no stream on this session is driven at all (spec §4.3
    /// `restart_streams`, §4.1 "Session-level flow control (Q3)").
    pub fn restart_streams(&mut self, drive: &mut impl FnMut(&mut StreamRecord)) {
        if let Some(front) = self.streams.pop_front() {
            self.streams.push_back(front);
        }
        let may_send = self.may_send();
        self.streams.retain_mut(|stream| {
            if stream.is_reclaimable() {
                return false;
            }
            if may_send && stream.disposition != Some(Outcome::Accepted) {
                drive(stream);
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_http2::StreamRole;

    #[test]
    fn need_read_buffers_is_refused_once_read_side_closed() {
        let mut actor = ConnectionActor::new(false);
        assert!(actor.on_need_read_buffers());
        actor.on_closed_read();
        assert!(!actor.on_need_read_buffers());
    }

    #[test]
    fn read_is_skipped_while_q2_blocked() {
        let actor = ConnectionActor::new(false);
        assert!(actor.on_read());
        actor.flags.q2_blocked.store(true, Ordering::Release);
        assert!(!actor.on_read());
    }

    #[test]
    fn wake_clears_restart_flag_exactly_once() {
        let mut actor = ConnectionActor::new(false);
        actor.flags.q2_blocked.store(true, Ordering::Release);
        actor.flags.q2_restart.store(true, Ordering::Release);
        assert!(actor.on_wake());
        assert!(!actor.flags.q2_blocked.load(Ordering::Acquire));
        assert!(!actor.on_wake(), "second wake has nothing to clear");
    }

    #[test]
    fn both_sides_closed_triggers_disconnect_handling() {
        let mut actor = ConnectionActor::new(false);
        assert!(!actor.on_closed_read());
        assert!(actor.on_closed_write());
    }

    #[test]
    fn disconnected_schedules_reconnect_only_for_live_egress() {
        let mut ingress = ConnectionActor::new(false);
        assert!(!ingress.on_disconnected(false));

        let mut egress = ConnectionActor::new(true);
        assert!(egress.on_disconnected(false));

        let mut deleted_egress = ConnectionActor::new(true);
        assert!(!deleted_egress.on_disconnected(true));
    }

    #[test]
    fn restart_streams_frees_reclaimable_and_drives_the_rest() {
        let mut actor = ConnectionActor::new(false);
        let mut done = StreamRecord::new(StreamRole::Egress);
        done.state = router_http2::StreamState::FullyClosed;
        done.out_msg_send_complete = true;
        actor.push_stream(done);

        let mut pending = StreamRecord::new(StreamRole::Egress);
        pending.disposition = None;
        actor.push_stream(pending);

        let mut accepted = StreamRecord::new(StreamRole::Egress);
        accepted.disposition = Some(Outcome::Accepted);
        actor.push_stream(accepted);

        let mut driven = 0;
        actor.restart_streams(&mut |_s| driven += 1);

        assert_eq!(actor.stream_count(), 2, "the reclaimable stream was freed");
        assert_eq!(driven, 1, "only the non-accepted stream is driven");
    }

    #[test]
    fn ingress_data_blocks_read_once_q2_trips_and_wake_clears_it() {
        let actor = ConnectionActor::new(false);
        let content = MessageContent::new();
        let mut record = StreamRecord::new(StreamRole::Ingress);

        let full_buffer = vec![b'x'; router_message::DEFAULT_BUFFER_CAPACITY];
        for _ in 0..router_message::Q2_UPPER {
            actor.on_ingress_data(&content, &full_buffer, &mut record);
        }

        assert!(!actor.on_read(), "Q2 blocked must stop further reads");
        assert!(actor.flags.q2_blocked.load(Ordering::Acquire));
    }

    #[test]
    fn q3_blocked_session_drives_no_stream() {
        let mut actor = ConnectionActor::new(true);
        let mut stream = StreamRecord::new(StreamRole::Egress);
        stream.disposition = None;
        actor.push_stream(stream);

        actor.q3.enqueue(crate::config::Q3_UPPER);
        assert!(!actor.may_send());

        let mut driven = 0;
        actor.restart_streams(&mut |_s| driven += 1);
        assert_eq!(driven, 0, "Q3 blocked must stop every stream on the session");
    }

    #[test]
    fn write_completed_drains_q3_and_resumes_driving() {
        let mut actor = ConnectionActor::new(true);
        let mut stream = StreamRecord::new(StreamRole::Egress);
        stream.disposition = None;
        actor.push_stream(stream);

        actor.q3.enqueue(crate::config::Q3_UPPER);
        assert!(!actor.may_send());

        let mut driven = 0;
        actor.on_write_completed(crate::config::Q3_UPPER - crate::config::Q3_LOWER, |_s| driven += 1);

        assert!(actor.may_send());
        assert_eq!(driven, 1);
    }
}
