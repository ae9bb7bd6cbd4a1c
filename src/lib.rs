//! # `rootstack_gc`
//!
//! A tracing garbage collector embedded as a library inside a host process.
//! Objects opt in to collection by wrapping them in [`Gc<T>`] and implementing
//! [`Trace`]; the collector reclaims unreachable cycles that plain [`Drop`]
//! (and reference counting) cannot.
//!
//! ## Overview
//!
//! Every managed object is born rooted: allocating through [`new_gc`] or a
//! collector's [`GarbageCollector::allocate`] puts the new object straight
//! onto that collector's root stack, instead of requiring a stack scan to
//! discover roots. Call [`GarbageCollector::unmark`] (or drop a [`GcRoot`])
//! once the allocating scope no longer needs to keep the object alive by
//! itself; reachability from the remaining roots takes over from there.
//!
//! Each OS thread owns exactly one collector, obtained lazily via
//! [`get_gc`]; one additional "static" collector is shared process-wide via
//! [`get_static_gc`], for objects that must outlive the thread that created
//! them. An object allocated in one collector can still be reached, and
//! marked, from another thread's trace pass; the registry's object-to-owner
//! index routes `mark` calls to whichever collector actually owns the target.
//!
//! ## Example
//!
//! ```
//! use rootstack_gc::{Gc, GarbageCollector, Trace, new_gc};
//!
//! struct Node {
//!     next: Option<Gc<Node>>,
//! }
//!
//! impl Trace for Node {
//!     fn trace(&self, collector: &GarbageCollector) {
//!         self.next.trace(collector);
//!     }
//! }
//!
//! let leaf = new_gc(Node { next: None }).expect("allocation succeeds");
//! let root = new_gc(Node { next: Some(leaf) }).expect("allocation succeeds");
//! assert!(root.next.is_some());
//! ```

#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::unwrap_used)]

mod collector;
mod config;
mod containers;
mod error;
mod gc;
mod gc_box;
mod metadata;
mod pointers;
mod registry;
mod root_guard;

pub use collector::{GarbageCollector, Trace};
pub use config::{Configuration, Statistics};
pub use containers::{GcMap, GcSet, GcVec};
pub use error::{Error, Result};
pub use gc::{Gc, new_gc, new_static_gc};
pub use pointers::ObjectId;
pub use registry::{gc_init, gc_term, get_gc, get_static_gc};
pub use root_guard::GcRoot;
