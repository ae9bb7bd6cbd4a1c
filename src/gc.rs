//! The `Gc<T>` smart pointer.

use crate::collector::{GarbageCollector, Trace};
use crate::error::Result;
use crate::gc_box::GcBox;
use crate::pointers::ObjectId;
use crate::registry;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::{self, NonNull};

/// A garbage-collected pointer to a value of type `T`.
///
/// `Gc<T>` is a bare two-word handle: a pointer plus `PhantomData`. It
/// performs no reference counting and, unlike `Rc<T>`/`Arc<T>`, dropping one
/// has no effect on the pointee's lifetime; reachability is decided solely
/// by the owning collector's mark/sweep pass, not by how many `Gc<T>` values
/// exist. Cloning is a pointer copy.
pub struct Gc<T> {
    ptr: NonNull<GcBox<T>>,
    phantom: PhantomData<GcBox<T>>,
}

impl<T> Gc<T> {
    /// Allocates `data` in the calling thread's collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn new(data: T) -> Result<Self>
    where
        T: Trace + Send + Sync + 'static,
    {
        Self::with_collector(&registry::get_gc(), data)
    }

    /// Allocates `data` in a specific collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn with_collector(collector: &GarbageCollector, data: T) -> Result<Self>
    where
        T: Trace + Send + Sync + 'static,
    {
        collector.allocate(data)
    }

    pub(crate) fn from_raw(ptr: NonNull<GcBox<T>>) -> Self {
        Self {
            ptr,
            phantom: PhantomData,
        }
    }

    /// Returns `true` if the two `Gc`s point to the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }

    /// Returns a raw pointer to the data.
    ///
    /// The caller must ensure the owning collector has not swept this
    /// object, or the pointer will dangle.
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        ptr::addr_of!(**self)
    }

    /// This object's collector-assigned identity, used by `mark`/`unmark`.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId::from_ptr(self.ptr.as_ptr())
    }

    /// Makes a mutable reference into the given `Gc`.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other reference to the data is live for the
    /// duration of the returned borrow.
    #[must_use]
    pub unsafe fn get_mut_unchecked(&mut self) -> &mut T {
        // Safety: the caller guarantees exclusive access; `self.ptr` is
        // always valid for as long as the object is in its collector's heap.
        unsafe { &mut self.ptr.as_mut().data }
    }

    fn inner(&self) -> &GcBox<T> {
        // Safety: `self.ptr` was produced by a successful `allocate` call
        // and remains valid until the owning collector sweeps it; a `Gc<T>`
        // that outlives a sweep of its own object is a use-after-free bug in
        // user code, not something this type can prevent (see module docs).
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            phantom: PhantomData,
        }
    }
}

impl<T> Deref for Gc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner().data
    }
}

impl<T> Drop for Gc<T> {
    fn drop(&mut self) {
        // No-op: `Gc<T>` does not own the object's lifetime, the collector
        // it was allocated from does.
    }
}

// Safety: the pointer is just an address; all access to the pointee goes
// through Deref, and T: Send + Sync is required by every constructor.
unsafe impl<T: Send + Sync> Send for Gc<T> {}
unsafe impl<T: Send + Sync> Sync for Gc<T> {}

impl<T: fmt::Display> fmt::Display for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl<T: fmt::Debug> fmt::Debug for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T> fmt::Pointer for Gc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

impl<T: PartialEq> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Eq> Eq for Gc<T> {}

impl<T: PartialOrd> PartialOrd for Gc<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (**self).partial_cmp(&**other)
    }
}

impl<T: Ord> Ord for Gc<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (**self).cmp(&**other)
    }
}

impl<T: Hash> Hash for Gc<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (**self).hash(state);
    }
}

impl<T> Borrow<T> for Gc<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T> AsRef<T> for Gc<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> From<&Gc<T>> for ObjectId {
    fn from(value: &Gc<T>) -> Self {
        value.id()
    }
}

impl<T: Trace> Trace for Gc<T> {
    fn trace(&self, collector: &GarbageCollector) {
        collector.mark(self.id());
    }
}

/// Allocates `data` in the calling thread's collector and immediately
/// requests a collection, keeping the live set tight under heavy
/// allocation. This is the "allocate then collect" idiom.
///
/// # Errors
///
/// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
/// allocator cannot satisfy the request.
pub fn new_gc<T>(data: T) -> Result<Gc<T>>
where
    T: Trace + Send + Sync + 'static,
{
    let collector = registry::get_gc();
    let gc = Gc::with_collector(&collector, data)?;
    collector.collect(true);
    Ok(gc)
}

/// Allocates `data` in the process-wide static collector and immediately
/// requests a collection. Objects allocated here outlive the thread that
/// created them.
///
/// # Errors
///
/// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
/// allocator cannot satisfy the request.
pub fn new_static_gc<T>(data: T) -> Result<Gc<T>>
where
    T: Trace + Send + Sync + 'static,
{
    let collector = registry::get_static_gc();
    let gc = Gc::with_collector(&collector, data)?;
    collector.collect(true);
    Ok(gc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::GarbageCollector;
    use std::collections::{BTreeMap, HashSet};

    fn alloc<T: Trace + Send + Sync + 'static>(collector: &GarbageCollector, data: T) -> Result<Gc<T>> {
        Gc::with_collector(collector, data)
    }

    #[test]
    fn creation_and_access() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc = alloc(&collector, 42)?;
        assert_eq!(*gc, 42);
        Ok(())
    }

    #[test]
    fn creation_with_different_types() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc_int = alloc(&collector, 123)?;
        let gc_string = alloc(&collector, "Hello, World!".to_string())?;
        let gc_vec = alloc(&collector, vec![1, 2, 3, 4, 5])?;

        assert_eq!(*gc_int, 123);
        assert_eq!(*gc_string, "Hello, World!");
        assert_eq!(*gc_vec, vec![1, 2, 3, 4, 5]);
        Ok(())
    }

    #[test]
    fn clone_points_to_same_allocation() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc1 = alloc(&collector, 42)?;
        let gc2 = gc1.clone();

        assert_eq!(*gc1, 42);
        assert_eq!(*gc2, 42);
        assert!(Gc::ptr_eq(&gc1, &gc2));
        Ok(())
    }

    #[test]
    fn equality_is_value_based() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc1 = alloc(&collector, 42)?;
        let gc2 = alloc(&collector, 42)?;
        let gc3 = gc1.clone();

        assert_eq!(gc1, gc2);
        assert_eq!(gc1, gc3);
        assert!(Gc::ptr_eq(&gc1, &gc3));
        assert!(!Gc::ptr_eq(&gc1, &gc2));
        Ok(())
    }

    #[test]
    fn with_complex_types() -> Result<()> {
        let collector = GarbageCollector::new();
        let mut map = BTreeMap::new();
        map.insert("key1", 10);
        map.insert("key2", 20);

        let gc_map = alloc(&collector, map)?;
        let gc_map_clone = gc_map.clone();

        assert_eq!(gc_map.get("key1"), Some(&10));
        assert_eq!(gc_map_clone.get("key2"), Some(&20));
        assert!(Gc::ptr_eq(&gc_map, &gc_map_clone));
        Ok(())
    }

    #[test]
    fn debug_display_pointer() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc = alloc(&collector, 42)?;

        assert_eq!(format!("{gc:?}"), "42");
        assert_eq!(format!("{gc}"), "42");
        assert!(format!("{gc:p}").starts_with("0x"));
        Ok(())
    }

    #[test]
    fn ordering() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc1 = alloc(&collector, 10)?;
        let gc2 = alloc(&collector, 20)?;
        let gc3 = alloc(&collector, 10)?;

        assert!(gc1 < gc2);
        assert!(gc2 > gc1);
        assert_eq!(gc1, gc3);
        Ok(())
    }

    #[test]
    fn hash_matches_value() -> Result<()> {
        let collector = GarbageCollector::new();
        let gc1 = alloc(&collector, 42)?;
        let gc2 = alloc(&collector, 42)?;
        let gc3 = alloc(&collector, 43)?;

        let mut set = HashSet::new();
        set.insert(gc1.clone());
        set.insert(gc2);
        set.insert(gc3);

        assert_eq!(set.len(), 2);
        assert!(set.contains(&gc1));
        Ok(())
    }
}
