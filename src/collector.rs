//! The per-collector mark/sweep engine.

use crate::config::{Configuration, Statistics};
use crate::error::{Error, Result};
use crate::gc::Gc;
use crate::gc_box::GcBox;
use crate::metadata::ObjectMetadata;
use crate::pointers::ObjectId;
use crate::registry;
use indexmap::IndexSet;
use parking_lot::{Mutex, ReentrantMutex};
use std::alloc::Layout;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::ThreadId;
use tracing::{debug, trace};

/// Capability trait implemented by every type that can live behind a
/// [`Gc<T>`]. `trace` must call `.trace(collector)` on every managed
/// reference the type holds, directly or through a field's own `Trace` impl.
/// Types with no managed references get the blanket no-op impls below.
pub trait Trace {
    fn trace(&self, collector: &GarbageCollector);
}

macro_rules! impl_trace_noop {
    ($($ty:ty),* $(,)?) => {
        $(impl Trace for $ty {
            fn trace(&self, _collector: &GarbageCollector) {}
        })*
    };
}

impl_trace_noop!(
    (),
    bool,
    char,
    f32,
    f64,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    String
);

impl Trace for &str {
    fn trace(&self, _collector: &GarbageCollector) {}
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, collector: &GarbageCollector) {
        if let Some(value) = self {
            value.trace(collector);
        }
    }
}

impl<T: Trace> Trace for Vec<T> {
    fn trace(&self, collector: &GarbageCollector) {
        for value in self {
            value.trace(collector);
        }
    }
}

impl<T: Trace> Trace for parking_lot::Mutex<T> {
    fn trace(&self, collector: &GarbageCollector) {
        self.lock().trace(collector);
    }
}

impl<T: Trace> Trace for std::collections::BTreeSet<T> {
    fn trace(&self, collector: &GarbageCollector) {
        for value in self {
            value.trace(collector);
        }
    }
}

impl<K: Trace, V: Trace> Trace for std::collections::BTreeMap<K, V> {
    fn trace(&self, collector: &GarbageCollector) {
        for (key, value) in self {
            key.trace(collector);
            value.trace(collector);
        }
    }
}

/// Which slot in the registry a collector occupies. `Detached` collectors
/// are created directly (via [`GarbageCollector::new`]) and aren't reachable
/// through `get_gc`/`get_static_gc`; useful for isolated tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollectorKind {
    Thread(ThreadId),
    Static,
    Detached,
}

struct CollectorState {
    heap: HashMap<ObjectId, ObjectMetadata>,
    roots: IndexSet<ObjectId>,
    allocations_since_collect: usize,
}

/// A single collector instance: a heap set, a root stack, and the mark/sweep
/// logic that reclaims unreachable objects. Every thread owns exactly one
/// (created lazily by [`crate::get_gc`]); one additional "static" instance is
/// shared process-wide ([`crate::get_static_gc`]).
pub struct GarbageCollector {
    this: Weak<GarbageCollector>,
    kind: CollectorKind,
    configuration: Configuration,
    state: ReentrantMutex<RefCell<CollectorState>>,
    stats: Mutex<Statistics>,
}

impl GarbageCollector {
    /// Creates a standalone collector with default configuration, not tied
    /// to any thread or the static registry slot.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_config(Configuration::default())
    }

    /// Creates a standalone collector with a custom configuration.
    #[must_use]
    pub fn with_config(configuration: Configuration) -> Arc<Self> {
        Self::new_internal(CollectorKind::Detached, configuration)
    }

    pub(crate) fn for_registry(kind: CollectorKind, configuration: Configuration) -> Arc<Self> {
        Self::new_internal(kind, configuration)
    }

    fn new_internal(kind: CollectorKind, configuration: Configuration) -> Arc<Self> {
        Arc::new_cyclic(|this| {
            let state = CollectorState {
                heap: HashMap::with_capacity(configuration.initial_capacity),
                roots: IndexSet::with_capacity(configuration.initial_capacity),
                allocations_since_collect: 0,
            };
            Self {
                this: this.clone(),
                kind,
                configuration,
                state: ReentrantMutex::new(RefCell::new(state)),
                stats: Mutex::new(Statistics::default()),
            }
        })
    }

    fn weak(&self) -> Weak<GarbageCollector> {
        self.this.clone()
    }

    pub(crate) fn kind(&self) -> CollectorKind {
        self.kind
    }

    /// A short, non-empty string identifying this build of the collector.
    #[must_use]
    pub fn gc_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Allocates `data` as a new managed object owned by this collector,
    /// registers it in the heap set, and pushes it onto the root stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`] if the underlying allocator cannot
    /// satisfy the request.
    pub fn allocate<T>(&self, data: T) -> Result<Gc<T>>
    where
        T: Trace + Send + Sync + 'static,
    {
        let layout = Layout::new::<GcBox<T>>();
        // Safety: `layout` is the layout of `GcBox<T>`, which is always
        // non-zero-sized (it carries at least `T`), so `alloc` either
        // returns a valid, suitably aligned block or null.
        let raw = unsafe { std::alloc::alloc(layout) }.cast::<GcBox<T>>();
        let Some(ptr) = std::ptr::NonNull::new(raw) else {
            return Err(Error::Allocation { layout });
        };
        // Safety: `ptr` was just allocated with the layout of `GcBox<T>` and
        // has not been read; writing the constructed value through it is
        // valid, and nothing aliases it yet.
        unsafe { ptr.as_ptr().write(GcBox::new(data)) };

        let id = ObjectId::from_ptr(ptr.as_ptr());
        let metadata = ObjectMetadata::new::<T>(ptr.as_ptr());
        let size = metadata.size();

        {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.heap.insert(id, metadata);
            state.roots.insert(id);
            state.allocations_since_collect += 1;
        }

        registry::register_owner(id, self.weak());
        trace!(id = id.0, size, "allocated managed object");

        let should_collect = {
            let guard = self.state.lock();
            let state = guard.borrow();
            state.allocations_since_collect >= self.configuration.allocation_threshold
        };
        if should_collect {
            self.collect(false);
        }

        Ok(Gc::from_raw(ptr))
    }

    /// Removes `id` from the root stack. A no-op if `id` is not currently
    /// rooted; never runs a destructor.
    pub fn unmark(&self, id: impl Into<ObjectId>) {
        let id = id.into();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.roots.shift_remove(&id) {
            trace!(id = id.0, "unmarked root");
        }
    }

    /// Marks `id` reachable, dispatching to whichever collector actually
    /// owns it. Recurses into that object's `Trace::trace` the first time
    /// it is marked during this collection. A silent no-op if `id` isn't
    /// owned by any live collector (a stale reference).
    pub fn mark(&self, id: ObjectId) {
        if id.is_null() {
            return;
        }
        let Some(owner) = registry::owner_of(id) else {
            trace!(id = id.0, "mark of unknown object, treating as stale reference");
            return;
        };
        owner.mark_local(id);
    }

    fn mark_local(&self, id: ObjectId) {
        let guard = self.state.lock();
        let first_mark = {
            let mut state = guard.borrow_mut();
            match state.heap.get_mut(&id) {
                Some(metadata) => metadata.mark(),
                None => return,
            }
        };
        if !first_mark {
            return;
        }
        let trace_fn = {
            let state = guard.borrow();
            state.heap.get(&id).map(ObjectMetadata::trace_fn)
        };
        drop(guard);
        if let Some(trace_fn) = trace_fn {
            trace_fn.invoke(self);
        }
    }

    /// Runs a mark/sweep collection if `force` is set or the allocation
    /// threshold has been crossed since the last collection.
    pub fn collect(&self, force: bool) {
        let should_run = {
            let guard = self.state.lock();
            let state = guard.borrow();
            force || state.allocations_since_collect >= self.configuration.allocation_threshold
        };
        if should_run {
            self.run_collection();
        }
    }

    /// Empties the root stack, then runs an unconditional collection,
    /// guaranteeing every object this collector owns is destroyed.
    pub fn final_collect(&self) {
        {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.roots.clear();
        }
        self.run_collection();
    }

    fn run_collection(&self) {
        let start = std::time::Instant::now();
        debug!(kind = ?self.kind, "collection starting");

        let roots: Vec<ObjectId> = {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            for metadata in state.heap.values_mut() {
                metadata.unmark_for_next_trace();
            }
            state.roots.iter().copied().collect()
        };

        for id in &roots {
            self.mark_local(*id);
        }

        let (to_sweep, objects_marked) = {
            let guard = self.state.lock();
            let state = guard.borrow();
            let marked = state.heap.values().filter(|metadata| metadata.is_marked()).count();
            let dead: Vec<ObjectId> = state
                .heap
                .iter()
                .filter(|(_, metadata)| !metadata.is_marked())
                .map(|(id, _)| *id)
                .collect();
            (dead, marked)
        };

        let mut bytes_freed = 0;
        let mut objects_swept = 0;
        for id in &to_sweep {
            // A cross-collector `mark` from another thread's trace pass can
            // land after `to_sweep` was computed but before this id is
            // actually removed; re-checking `is_marked` under the same lock
            // that guards the removal closes that window, so an object
            // marked reachable in the meantime is not swept out from under it.
            let metadata = {
                let guard = self.state.lock();
                let mut state = guard.borrow_mut();
                match state.heap.get(id) {
                    Some(metadata) if !metadata.is_marked() => state.heap.remove(id),
                    _ => None,
                }
            };
            if let Some(metadata) = metadata {
                bytes_freed += metadata.size();
                objects_swept += 1;
                registry::unregister_owner(*id);
                metadata.drop_object();
            }
        }

        {
            let guard = self.state.lock();
            let mut state = guard.borrow_mut();
            state.allocations_since_collect = 0;
        }

        let duration = start.elapsed();
        {
            let mut stats = self.stats.lock();
            stats.collections_performed += 1;
            stats.objects_marked += objects_marked;
            stats.objects_swept += objects_swept;
            stats.bytes_freed += bytes_freed;
            stats.last_collection_duration = Some(duration);
        }

        debug!(objects_swept, bytes_freed, ?duration, "collection finished");
    }

    /// A snapshot of this collector's cumulative statistics.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.stats.lock().clone()
    }

    /// Number of objects currently in the heap set (not yet swept).
    #[must_use]
    pub fn heap_len(&self) -> usize {
        let guard = self.state.lock();
        guard.borrow().heap.len()
    }

    /// Number of objects currently on the root stack.
    #[must_use]
    pub fn root_len(&self) -> usize {
        let guard = self.state.lock();
        guard.borrow().roots.len()
    }
}

impl fmt::Debug for GarbageCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarbageCollector")
            .field("kind", &self.kind)
            .field("heap_len", &self.heap_len())
            .field("root_len", &self.root_len())
            .finish_non_exhaustive()
    }
}

impl Drop for GarbageCollector {
    fn drop(&mut self) {
        self.final_collect();
    }
}
