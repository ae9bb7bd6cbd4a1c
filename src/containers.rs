//! Managed-container facades: value handles over a GC-owned container.
//!
//! `GcVec<T>`, `GcSet<T>`, and `GcMap<K, V>` each wrap a single `Gc` over an
//! interior-mutable standard container. A `parking_lot::Mutex` guards the
//! container rather than a `RefCell`: objects allocated through
//! [`GarbageCollector::allocate`](crate::GarbageCollector::allocate) must be
//! `Sync` (a cross-collector `mark` can observe them from a different OS
//! thread than the one that allocated them), and `RefCell` is never `Sync`.
//!
//! Cloning a facade clones the inner `Gc`, a cheap, aliased handle over the
//! *same* backing container, not a copy of its contents. Elements that are
//! themselves `Gc<U>` are rooted independently by their own allocation and
//! must be unmarked independently; the facade does not unmark them on your
//! behalf.

use crate::collector::{GarbageCollector, Trace};
use crate::error::Result;
use crate::gc::Gc;
use crate::pointers::ObjectId;
use crate::registry;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A managed, growable vector.
pub struct GcVec<T> {
    inner: Gc<Mutex<Vec<T>>>,
}

impl<T: Trace + Send + Sync + 'static> GcVec<T> {
    /// Allocates an empty vector in the calling thread's collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn new() -> Result<Self> {
        Self::with_collector(&registry::get_gc())
    }

    /// Allocates an empty vector with room for `capacity` elements without
    /// reallocating.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let inner = registry::get_gc().allocate(Mutex::new(Vec::with_capacity(capacity)))?;
        Ok(Self { inner })
    }

    /// Allocates a vector in a specific collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn with_collector(collector: &GarbageCollector) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(Vec::new()))?;
        Ok(Self { inner })
    }

    /// Allocates a vector in `collector`, populated from `iter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn from_iter_in(collector: &GarbageCollector, iter: impl IntoIterator<Item = T>) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(iter.into_iter().collect()))?;
        Ok(Self { inner })
    }

    pub fn push(&self, value: T) {
        self.inner.lock().push(value);
    }

    #[must_use]
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().get(index).cloned()
    }

    /// Calls `f` with a reference to every element, in order, while holding
    /// the container's lock.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for value in self.inner.lock().iter() {
            f(value);
        }
    }

    /// This facade's underlying identity, for `mark`/`unmark`.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id()
    }

    /// Element-wise equality, for callers who need it instead of the
    /// identity-based `PartialEq` impl.
    #[must_use]
    pub fn eq_elements(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        *self.inner.lock() == *other.inner.lock()
    }
}

impl<T> Clone for GcVec<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> PartialEq for GcVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T> Eq for GcVec<T> {}

impl<T: Trace> Trace for GcVec<T> {
    fn trace(&self, collector: &GarbageCollector) {
        self.inner.trace(collector);
    }
}

impl<T: fmt::Debug> fmt::Debug for GcVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcVec").field(&*self.inner.lock()).finish()
    }
}

/// A managed, sorted set.
pub struct GcSet<T: Ord> {
    inner: Gc<Mutex<BTreeSet<T>>>,
}

impl<T: Trace + Ord + Send + Sync + 'static> GcSet<T> {
    /// Allocates an empty set in the calling thread's collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn new() -> Result<Self> {
        Self::with_collector(&registry::get_gc())
    }

    /// Allocates a set in a specific collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn with_collector(collector: &GarbageCollector) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(BTreeSet::new()))?;
        Ok(Self { inner })
    }

    /// Allocates a set in `collector`, populated from `iter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn from_iter_in(collector: &GarbageCollector, iter: impl IntoIterator<Item = T>) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(iter.into_iter().collect()))?;
        Ok(Self { inner })
    }

    pub fn insert(&self, value: T) -> bool {
        self.inner.lock().insert(value)
    }

    pub fn remove(&self, value: &T) -> bool {
        self.inner.lock().remove(value)
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.inner.lock().contains(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Calls `f` with a reference to every element, in ascending order,
    /// while holding the container's lock.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for value in self.inner.lock().iter() {
            f(value);
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id()
    }

    #[must_use]
    pub fn eq_elements(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        *self.inner.lock() == *other.inner.lock()
    }
}

impl<T: Ord> Clone for GcSet<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: Ord> PartialEq for GcSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T: Ord> Eq for GcSet<T> {}

impl<T: Trace + Ord> Trace for GcSet<T> {
    fn trace(&self, collector: &GarbageCollector) {
        self.inner.trace(collector);
    }
}

impl<T: Ord + fmt::Debug> fmt::Debug for GcSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcSet").field(&*self.inner.lock()).finish()
    }
}

/// A managed, sorted map.
pub struct GcMap<K: Ord, V> {
    inner: Gc<Mutex<BTreeMap<K, V>>>,
}

impl<K: Trace + Ord + Send + Sync + 'static, V: Trace + Send + Sync + 'static> GcMap<K, V> {
    /// Allocates an empty map in the calling thread's collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn new() -> Result<Self> {
        Self::with_collector(&registry::get_gc())
    }

    /// Allocates a map in a specific collector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn with_collector(collector: &GarbageCollector) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(BTreeMap::new()))?;
        Ok(Self { inner })
    }

    /// Allocates a map in `collector`, populated from `iter`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Allocation`](crate::Error::Allocation) if the global
    /// allocator cannot satisfy the request.
    pub fn from_iter_in(collector: &GarbageCollector, iter: impl IntoIterator<Item = (K, V)>) -> Result<Self> {
        let inner = collector.allocate(Mutex::new(iter.into_iter().collect()))?;
        Ok(Self { inner })
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.lock().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Calls `f` with a reference to every key/value pair, in ascending key
    /// order, while holding the container's lock.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in self.inner.lock().iter() {
            f(key, value);
        }
    }

    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.id()
    }

    #[must_use]
    pub fn eq_elements(&self, other: &Self) -> bool
    where
        K: PartialEq,
        V: PartialEq,
    {
        *self.inner.lock() == *other.inner.lock()
    }
}

impl<K: Ord, V> Clone for GcMap<K, V> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<K: Ord, V> PartialEq for GcMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<K: Ord, V> Eq for GcMap<K, V> {}

impl<K: Trace + Ord, V: Trace> Trace for GcMap<K, V> {
    fn trace(&self, collector: &GarbageCollector) {
        self.inner.trace(collector);
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for GcMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GcMap").field(&*self.inner.lock()).finish()
    }
}
