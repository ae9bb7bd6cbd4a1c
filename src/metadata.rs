//! Per-object bookkeeping kept in a collector's heap set.

use crate::gc_box::GcBox;
use crate::pointers::{ObjectId, TraceFn};

/// Type-erased drop function that frees a `GcBox<T>` by reconstructing an
/// owning `Box` over the allocation (the same global allocator and layout
/// `GarbageCollector::allocate` used to create it) and letting its
/// destructor run.
type DropFn = Box<dyn FnOnce() + Send>;

/// `*mut GcBox<T>` is not `Send` on its own, but `T: Send` makes sending the
/// allocation it points to sound.
struct SendPtr<T>(*mut GcBox<T>);

// Safety: `T: Send` per the bound on `SendPtr`'s only constructor.
unsafe impl<T: Send> Send for SendPtr<T> {}

/// Metadata the collector keeps for every object in its heap set: enough to
/// mark it during trace, and enough to destroy it during sweep without
/// knowing its concrete type.
pub(crate) struct ObjectMetadata {
    id: ObjectId,
    size: usize,
    marked: bool,
    trace_fn: TraceFn,
    drop_fn: Option<DropFn>,
}

impl ObjectMetadata {
    /// Builds metadata for a freshly allocated `GcBox<T>`. `ptr` must be a
    /// valid, uniquely-owned pointer to a `GcBox<T>` allocated with
    /// `std::alloc::alloc` using `Layout::new::<GcBox<T>>()`, as
    /// `GarbageCollector::allocate` produces.
    pub(crate) fn new<T: Send + Sync + crate::collector::Trace + 'static>(ptr: *mut GcBox<T>) -> Self {
        let id = ObjectId::from_ptr(ptr);
        let size = size_of::<GcBox<T>>();
        // Safety: `ptr` is a live, uniquely-owned allocation; taking the
        // address of its `data` field without reading through it is valid.
        let data_ptr: *const T = unsafe { std::ptr::addr_of!((*ptr).data) };
        let trace_fn = TraceFn::new(data_ptr);
        let ptr = SendPtr(ptr);
        let drop_fn: DropFn = Box::new(move || {
            let ptr = ptr;
            // Safety: `ptr` was allocated with `std::alloc::alloc` using the
            // layout of `GcBox<T>`, matching what `Box::from_raw` expects,
            // and `drop_object` guarantees this closure runs at most once,
            // after the object has been found unreachable.
            let _owned = unsafe { Box::from_raw(ptr.0) };
        });

        Self {
            id,
            size,
            marked: false,
            trace_fn,
            drop_fn: Some(drop_fn),
        }
    }

    pub(crate) fn id(&self) -> ObjectId {
        self.id
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn is_marked(&self) -> bool {
        self.marked
    }

    /// Marks this object reachable. Returns `true` the first time it is
    /// marked during a given trace (used by `mark_local` to decide whether
    /// to recurse into the object's contents).
    pub(crate) fn mark(&mut self) -> bool {
        let was_unmarked = !self.marked;
        self.marked = true;
        was_unmarked
    }

    pub(crate) fn unmark_for_next_trace(&mut self) {
        self.marked = false;
    }

    pub(crate) fn trace_fn(&self) -> TraceFn {
        self.trace_fn
    }

    /// Consumes the metadata and runs its drop function, catching any panic
    /// so one malformed destructor cannot abort the rest of a sweep.
    pub(crate) fn drop_object(mut self) {
        if let Some(drop_fn) = self.drop_fn.take()
            && std::panic::catch_unwind(std::panic::AssertUnwindSafe(drop_fn)).is_err()
        {
            tracing::error!(id = self.id.0, "managed object panicked while dropping");
        }
    }
}

impl std::fmt::Debug for ObjectMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMetadata")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("marked", &self.marked)
            .finish_non_exhaustive()
    }
}
