//! A generational-handle table standing in for the source's typed-slab
//! allocator with per-slot sequence numbers (spec §9 "Safe weak pointer").
//!
//! A stored `(index, generation)` pair becomes dangling-safe on slot
//! reuse: dereferencing re-reads the table's current generation for that
//! index and only yields the value if it still matches. This is what lets
//! the Q2-unblocked callback (spec §4.1) and the activation handle (spec
//! §5) be handed across threads without risking a use-after-free when the
//! connection they name has already torn down and its slot been recycled.

use parking_lot::Mutex;

/// A `(index, generation)` pair. Cheap to copy, cheap to send across
/// threads; carries no borrow and no lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SafeHandle {
    index: usize,
    generation: u64,
}

struct Slot<T> {
    value: Option<T>,
    // Bumped every time this index is freed, so a handle minted before
    // the free never matches whatever later occupies the same index.
    generation: u64,
}

struct Inner<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
}

/// Table of live values, each reachable only through a [`SafeHandle`]
/// whose generation still matches.
pub struct GenerationalTable<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> Default for GenerationalTable<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: Vec::new(),
                free: Vec::new(),
            }),
        }
    }
}

impl<T> GenerationalTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning a handle valid until [`Self::remove`] is
    /// called with a matching handle.
    pub fn insert(&self, value: T) -> SafeHandle {
        let mut inner = self.inner.lock();
        if let Some(index) = inner.free.pop() {
            let slot = &mut inner.slots[index];
            slot.value = Some(value);
            SafeHandle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = inner.slots.len();
            inner.slots.push(Slot {
                value: Some(value),
                generation: 0,
            });
            SafeHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Remove the value behind `handle` if the generation still matches,
    /// returning it, and bump the slot's generation so any other
    /// outstanding (now-stale) handle is rejected even after the slot is
    /// reused by a later [`Self::insert`].
    pub fn remove(&self, handle: SafeHandle) -> Option<T> {
        let mut inner = self.inner.lock();
        let slot = inner.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        inner.free.push(handle.index);
        Some(value)
    }

    /// Dereference `handle`, yielding `None` if the slot was freed (and
    /// possibly reused by something else) since the handle was minted.
    pub fn with<R>(&self, handle: SafeHandle, f: impl FnOnce(&T) -> R) -> Option<R> {
        let inner = self.inner.lock();
        let slot = inner.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref().map(f)
    }
}
