//! The allocation unit backing every `Gc<T>`.

/// The heap block a `Gc<T>` points at. All GC bookkeeping (mark state, trace
/// function, drop function) lives in the owning collector's `ObjectMetadata`
/// map, keyed by this block's address. `GcBox` itself carries nothing but
/// the user's data, so `Gc<T>::deref` is a single pointer indirection.
pub(crate) struct GcBox<T> {
    pub(crate) data: T,
}

impl<T> GcBox<T> {
    pub(crate) fn new(data: T) -> Self {
        Self { data }
    }
}
