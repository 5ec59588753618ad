//! Cross-thread wake of a peer connection actor (spec §5 "activation",
//! "Weak references across threads").
//!
//! A producer on one I/O thread (an HTTP/2 stream writing into a shared
//! [`router_message::MessageContent`]) needs to wake a consumer
//! connection that may be running on a different thread, or may already
//! have torn down. Registration happens once per connection through a
//! [`router_message::GenerationalTable`]; activation re-validates the
//! handle before touching the connection, so a torn-down connection is
//! simply not woken rather than accessed after free.

use parking_lot::Mutex;
use router_message::{GenerationalTable, MessageContent, Q2Signal, SafeHandle};
use std::sync::Arc;

/// Registry mapping [`SafeHandle`]s to live connection actors of type
/// `C`, plus the single global lock spec §5 calls the "server-activation
/// lock": it must be held for the wake of any actor from outside that
/// actor's own thread, and — per the documented lock order — it is
/// always the innermost lock taken.
pub struct ActivationRegistry<C> {
    table: GenerationalTable<Arc<C>>,
    server_lock: Mutex<()>,
}

impl<C> Default for ActivationRegistry<C> {
    fn default() -> Self {
        Self {
            table: GenerationalTable::new(),
            server_lock: Mutex::new(()),
        }
    }
}

impl<C> ActivationRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection: Arc<C>) -> SafeHandle {
        self.table.insert(connection)
    }

    pub fn unregister(&self, handle: SafeHandle) {
        self.table.remove(handle);
    }

    /// Wake the connection behind `handle`, if it is still registered.
    /// Returns whether the connection was found (and therefore woken).
    pub fn activate(&self, handle: SafeHandle, wake: impl FnOnce(&Arc<C>)) -> bool {
        let _server_lock = self.server_lock.lock();
        self.table.with(handle, wake).is_some()
    }
}

/// Anything the Q2-unblocked handler can poke to ask a connection to
/// resume reading (spec §4.3 `WAKE`).
pub trait RequestsRestart {
    fn request_restart(&self);
}

impl RequestsRestart for crate::actor::ConnectionActor {
    fn request_restart(&self) {
        self.flags.q2_restart.store(true, std::sync::atomic::Ordering::Release);
    }
}

/// Propagate a Q2 signal observed on a message's content to its
/// producer's connection actor, waking it if Q2 just became unblocked
/// (spec §4.1 Q2, §5 "Weak references across threads": "the Q2
/// unblocked handler is acquired via a refcounted safe-pointer"). A
/// no-op — and `false` — for any signal other than `BecameUnblocked`, or
/// if the content was never given a producer to wake (e.g. it has no
/// ingress side, or the ingress connection already tore down).
pub fn wake_producer_on_unblock<C: RequestsRestart>(
    signal: Q2Signal,
    content: &MessageContent,
    registry: &ActivationRegistry<C>,
) -> bool {
    if signal != Q2Signal::BecameUnblocked {
        return false;
    }
    match content.producer_activation() {
        Some(handle) => registry.activate(handle, |conn| conn.request_restart()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn activate_wakes_a_registered_connection() {
        let registry: ActivationRegistry<AtomicUsize> = ActivationRegistry::new();
        let conn = Arc::new(AtomicUsize::new(0));
        let handle = registry.register(conn.clone());

        let woken = registry.activate(handle, |c| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(woken);
        assert_eq!(conn.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn activate_after_unregister_is_a_safe_no_op() {
        let registry: ActivationRegistry<AtomicUsize> = ActivationRegistry::new();
        let conn = Arc::new(AtomicUsize::new(0));
        let handle = registry.register(conn.clone());
        registry.unregister(handle);

        let woken = registry.activate(handle, |c| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!woken);
        assert_eq!(conn.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wake_producer_on_unblock_requests_a_restart() {
        let registry: ActivationRegistry<crate::actor::ConnectionActor> = ActivationRegistry::new();
        let producer = Arc::new(crate::actor::ConnectionActor::new(false));
        let handle = registry.register(producer.clone());

        let content = MessageContent::new();
        content.set_producer_activation(handle);

        let woken = wake_producer_on_unblock(Q2Signal::BecameUnblocked, &content, &registry);
        assert!(woken);
        assert!(producer.flags.q2_restart.load(Ordering::Acquire));
    }

    #[test]
    fn wake_producer_on_unblock_ignores_other_signals() {
        let registry: ActivationRegistry<crate::actor::ConnectionActor> = ActivationRegistry::new();
        let producer = Arc::new(crate::actor::ConnectionActor::new(false));
        let handle = registry.register(producer.clone());

        let content = MessageContent::new();
        content.set_producer_activation(handle);

        assert!(!wake_producer_on_unblock(Q2Signal::BecameBlocked, &content, &registry));
        assert!(!wake_producer_on_unblock(Q2Signal::Unchanged, &content, &registry));
        assert!(!producer.flags.q2_restart.load(Ordering::Acquire));
    }
}
