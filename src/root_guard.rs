//! RAII wrapper that unmarks a rooted object when it goes out of scope.

use crate::collector::{GarbageCollector, Trace};
use crate::gc::Gc;
use std::ops::Deref;
use std::sync::Arc;

/// Wraps an already-rooted `Gc<T>` (every successful allocation is rooted)
/// and guarantees `unmark` runs when the guard is dropped.
///
/// Allocation already puts an object on its collector's root stack, so
/// `GcRoot` adds no bookkeeping of its own at construction; it exists to
/// give the *scope* that holds the allocation's root responsibility a place
/// to discharge it deterministically, instead of calling `unmark` by hand.
/// It is not `Clone`: only one scope should own the unmark call for a given
/// identity. Use [`GcRoot::clone_gc`] to hand out non-owning `Gc<T>` handles.
pub struct GcRoot<T> {
    collector: Arc<GarbageCollector>,
    gc: Gc<T>,
}

impl<T: Trace> GcRoot<T> {
    /// Wraps `gc`, taking over responsibility for unmarking it from
    /// `collector` when this guard drops.
    #[must_use]
    pub fn new(collector: Arc<GarbageCollector>, gc: Gc<T>) -> Self {
        Self { collector, gc }
    }

    /// Returns a non-owning clone of the underlying `Gc<T>`. The clone
    /// relies on this guard (or some other root) to keep the object alive.
    #[must_use]
    pub fn clone_gc(&self) -> Gc<T> {
        self.gc.clone()
    }
}

impl<T> Deref for GcRoot<T> {
    type Target = Gc<T>;

    fn deref(&self) -> &Self::Target {
        &self.gc
    }
}

impl<T: Trace> Trace for GcRoot<T> {
    fn trace(&self, collector: &GarbageCollector) {
        self.gc.trace(collector);
    }
}

impl<T> Drop for GcRoot<T> {
    fn drop(&mut self) {
        self.collector.unmark(&self.gc);
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for GcRoot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GcRoot").field(&self.gc).finish()
    }
}
