//! The adapter-global connection and listener/connector-list registry
//! (spec §5: "Connection-table and listener/connector lists live under
//! an adapter-global mutex taken only at list mutation").

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque identifier for a registered connection (an index assigned at
/// registration time; stable for the connection's lifetime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Tracks every live connection actor by id. The mutex here is the
/// "adapter-mutex" named first in the lock order (spec §5): it is only
/// ever held across a single list mutation or lookup, never across a
/// connection's own per-stream work.
pub struct ConnectionRegistry<C> {
    next_id: Mutex<u64>,
    connections: Mutex<HashMap<ConnectionId, Arc<C>>>,
}

impl<C> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self {
            next_id: Mutex::new(0),
            connections: Mutex::new(HashMap::new()),
        }
    }
}

impl<C> ConnectionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, connection: Arc<C>) -> ConnectionId {
        let id = {
            let mut next = self.next_id.lock();
            let id = ConnectionId(*next);
            *next += 1;
            id
        };
        self.connections.lock().insert(id, connection);
        id
    }

    pub fn remove(&self, id: ConnectionId) -> Option<Arc<C>> {
        self.connections.lock().remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<C>> {
        self.connections.lock().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every currently registered connection id, for
    /// operations that need to iterate (e.g. marking connectors for
    /// teardown; spec §6 "Deleting a connector with live connections
    /// marks them for teardown after current streams drain").
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.lock().keys().copied().collect()
    }
}
