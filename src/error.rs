//! Error handling for the garbage collector.

use std::alloc::Layout;
use std::sync::PoisonError;

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can occur while allocating, registering, or collecting
/// managed objects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The global allocator failed to satisfy an allocation request for a
    /// managed object.
    #[error("failed to allocate {} bytes for a managed object", .layout.size())]
    Allocation {
        /// Layout that could not be satisfied.
        layout: Layout,
    },
    /// A collector's internal lock could not be acquired.
    #[error("failed to acquire collector lock: {0}")]
    Lock(String),
    /// The collector registry could not complete a lookup or mutation.
    #[error("collector registry error: {0}")]
    Registry(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(error: PoisonError<T>) -> Self {
        Error::Lock(format!("poisoned lock: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_poison_error() {
        let poison_error: PoisonError<()> = PoisonError::new(());
        let error: Error = poison_error.into();
        assert!(matches!(error, Error::Lock(_)));
    }

    #[test]
    fn allocation_error_reports_size() {
        let layout = Layout::new::<u64>();
        let error = Error::Allocation { layout };
        assert!(error.to_string().contains("8 bytes"));
    }
}
