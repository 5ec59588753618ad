//! The router-core link surface the adapter consumes (spec §4.4).
//!
//! Router-core itself — distribution, the routing table, link credit
//! bookkeeping — is an external collaborator (spec §1, "Out of scope").
//! This module only names the operations the adapter calls on it and the
//! callbacks router-core drives back into the adapter. The concrete
//! implementation lives outside this workspace; tests and examples use
//! [`mock::MockLinkSource`].

use router_error::BoxError;
use std::fmt;

use crate::delivery::{DeliveryId, Direction, Outcome};

/// Opaque router-core link identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkHandle(pub u64);

/// Router-core link credit, as delivered by the `link_flow` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Credit(pub u32);

/// The operations router-core exposes to one connection actor, invoked on
/// that actor's own thread (spec §4.4, §5). `Message` is left abstract so
/// this crate does not need to depend on the streaming message type;
/// `router-http2` instantiates it as `Arc<router_message::MessageContent>`.
pub trait LinkSource: Send + Sync + 'static {
    type Message: Send + 'static;

    /// Attach a new link. `source`/`target` are AMQP addresses; `name` is
    /// the link name router-core uses for its own bookkeeping.
    fn link_first_attach(
        &self,
        dir: Direction,
        source: &str,
        target: &str,
        name: &str,
    ) -> Result<LinkHandle, BoxError>;

    fn link_set_context(&self, link: LinkHandle, ctx: u64);
    fn link_get_context(&self, link: LinkHandle) -> Option<u64>;

    /// Route a message for delivery on `link`. Returns a delivery handle
    /// immediately; whether credit was available yet is surfaced
    /// separately through [`LinkEvents::link_flow`].
    fn link_deliver(&self, link: LinkHandle, msg: Self::Message) -> Result<DeliveryId, BoxError>;

    /// Indicate more bytes are available for an already-routed,
    /// still-streaming delivery.
    fn delivery_continue(&self, delivery: DeliveryId);

    fn delivery_set_context(&self, delivery: DeliveryId, ctx: u64);
    fn delivery_get_context(&self, delivery: DeliveryId) -> Option<u64>;

    /// Report a terminal disposition for a delivery this actor owns.
    /// Per spec §5 "Ordering guarantees", callers must ensure this and
    /// [`LinkEvents::delivery_remote_state_updated`] are each emitted at
    /// most once per terminal state.
    fn delivery_remote_state_updated(&self, delivery: DeliveryId, outcome: Outcome, settled: bool);

    fn link_detach(&self, link: LinkHandle, close: bool);
}

/// Callbacks router-core drives back into the connection actor. These are
/// not direct return values from [`LinkSource`] calls — credit and
/// disposition updates can arrive asynchronously, from the router-core's
/// own thread, and must be marshaled onto the actor's event loop (spec
/// §4.3's `WAKE` event, §5 "Cross-connection interaction").
pub trait LinkEvents: Send + Sync + 'static {
    fn link_flow(&self, link: LinkHandle, credit: Credit);
    fn delivery_remote_state_updated(&self, delivery: DeliveryId, outcome: Outcome, settled: bool);
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// A minimal in-memory [`LinkSource`], useful for driving `router-http2`
/// and `router-transport` tests without a real router-core.
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Inner<M> {
        next_link: AtomicU64,
        next_delivery: AtomicU64,
        link_context: Mutex<HashMap<u64, u64>>,
        delivery_context: Mutex<HashMap<u64, u64>>,
        deliveries: Mutex<HashMap<u64, M>>,
        detached: Mutex<Vec<LinkHandle>>,
    }

    /// Routes every delivery immediately with full credit; good enough to
    /// exercise the adapter's framing and flow-control bookkeeping in
    /// isolation from real distribution logic.
    pub struct MockLinkSource<M> {
        inner: Arc<Inner<M>>,
    }

    impl<M> Default for MockLinkSource<M> {
        fn default() -> Self {
            Self {
                inner: Arc::new(Inner {
                    next_link: AtomicU64::new(1),
                    next_delivery: AtomicU64::new(1),
                    link_context: Mutex::new(HashMap::new()),
                    delivery_context: Mutex::new(HashMap::new()),
                    deliveries: Mutex::new(HashMap::new()),
                    detached: Mutex::new(Vec::new()),
                }),
            }
        }
    }

    impl<M> Clone for MockLinkSource<M> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }

    impl<M: Send + 'static> LinkSource for MockLinkSource<M> {
        type Message = M;

        fn link_first_attach(
            &self,
            _dir: Direction,
            _source: &str,
            _target: &str,
            _name: &str,
        ) -> Result<LinkHandle, BoxError> {
            let id = self.inner.next_link.fetch_add(1, Ordering::Relaxed);
            Ok(LinkHandle(id))
        }

        fn link_set_context(&self, link: LinkHandle, ctx: u64) {
            self.inner.link_context.lock().insert(link.0, ctx);
        }

        fn link_get_context(&self, link: LinkHandle) -> Option<u64> {
            self.inner.link_context.lock().get(&link.0).copied()
        }

        fn link_deliver(
            &self,
            _link: LinkHandle,
            msg: Self::Message,
        ) -> Result<DeliveryId, BoxError> {
            let id = self.inner.next_delivery.fetch_add(1, Ordering::Relaxed);
            self.inner.deliveries.lock().insert(id, msg);
            Ok(DeliveryId(id))
        }

        fn delivery_continue(&self, _delivery: DeliveryId) {}

        fn delivery_set_context(&self, delivery: DeliveryId, ctx: u64) {
            self.inner.delivery_context.lock().insert(delivery.0, ctx);
        }

        fn delivery_get_context(&self, delivery: DeliveryId) -> Option<u64> {
            self.inner.delivery_context.lock().get(&delivery.0).copied()
        }

        fn delivery_remote_state_updated(
            &self,
            _delivery: DeliveryId,
            _outcome: Outcome,
            _settled: bool,
        ) {
        }

        fn link_detach(&self, link: LinkHandle, _close: bool) {
            self.inner.detached.lock().push(link);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn attach_then_deliver_assigns_increasing_ids() {
            let ls: MockLinkSource<u32> = MockLinkSource::default();
            let l1 = ls.link_first_attach(Direction::Incoming, "s", "t", "n1").unwrap();
            let l2 = ls.link_first_attach(Direction::Incoming, "s", "t", "n2").unwrap();
            assert_ne!(l1, l2);

            let d1 = ls.link_deliver(l1, 42).unwrap();
            let d2 = ls.link_deliver(l2, 43).unwrap();
            assert_ne!(d1, d2);
        }

        #[test]
        fn context_round_trips() {
            let ls: MockLinkSource<u32> = MockLinkSource::default();
            let link = ls.link_first_attach(Direction::Outgoing, "s", "t", "n").unwrap();
            assert_eq!(ls.link_get_context(link), None);
            ls.link_set_context(link, 7);
            assert_eq!(ls.link_get_context(link), Some(7));
        }
    }
}
