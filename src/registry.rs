//! Process-wide collector registry: per-thread collectors, the shared
//! static collector, and the object-to-owner index that makes
//! cross-collector marking possible.

use crate::collector::{CollectorKind, GarbageCollector};
use crate::config::Configuration;
use crate::pointers::ObjectId;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, OnceLock, Weak};
use std::thread::{self, ThreadId};
use tracing::debug;

struct Registry {
    threads: Mutex<HashMap<ThreadId, Arc<GarbageCollector>>>,
    static_collector: OnceLock<Arc<GarbageCollector>>,
    owners: DashMap<ObjectId, Weak<GarbageCollector>>,
}

static REGISTRY: LazyLock<Registry> = LazyLock::new(|| Registry {
    threads: Mutex::new(HashMap::new()),
    static_collector: OnceLock::new(),
    owners: DashMap::new(),
});

thread_local! {
    static THIS_THREAD: RefCell<Option<Arc<GarbageCollector>>> = const { RefCell::new(None) };
    static EXIT_GUARD: ThreadExitGuard = const { ThreadExitGuard };
}

/// Dropped when a thread exits; tears down that thread's collector entry
/// outside the registry lock, per the registry's no-destructors-under-lock
/// contract.
struct ThreadExitGuard;

impl Drop for ThreadExitGuard {
    fn drop(&mut self) {
        on_thread_exit();
    }
}

/// Returns the calling thread's collector, creating it on first call.
#[must_use]
pub fn get_gc() -> Arc<GarbageCollector> {
    THIS_THREAD.with(|cell| {
        if let Some(existing) = cell.borrow().as_ref() {
            return existing.clone();
        }
        EXIT_GUARD.with(|_| {});
        let id = thread::current().id();
        let collector = GarbageCollector::for_registry(CollectorKind::Thread(id), Configuration::default());
        REGISTRY.threads.lock().insert(id, collector.clone());
        *cell.borrow_mut() = Some(collector.clone());
        debug!(?id, "thread collector created");
        collector
    })
}

/// Returns the process-wide static collector, creating it on first call.
#[must_use]
pub fn get_static_gc() -> Arc<GarbageCollector> {
    REGISTRY
        .static_collector
        .get_or_init(|| GarbageCollector::for_registry(CollectorKind::Static, Configuration::default()))
        .clone()
}

/// Primes the static collector. Idempotent; safe to call more than once.
pub fn gc_init() {
    let _ = get_static_gc();
}

/// Runs a final collection on the static collector and every still-registered
/// thread collector, then clears the registry. Intended for deterministic
/// teardown in test harnesses and embedding hosts.
pub fn gc_term() {
    if let Some(static_collector) = REGISTRY.static_collector.get() {
        static_collector.final_collect();
    }
    let threads: Vec<Arc<GarbageCollector>> = {
        let mut threads = REGISTRY.threads.lock();
        threads.drain().map(|(_, collector)| collector).collect()
    };
    for collector in threads {
        collector.final_collect();
    }
    debug!("registry terminated");
}

fn on_thread_exit() {
    let id = thread::current().id();
    let collector = REGISTRY.threads.lock().remove(&id);
    if let Some(collector) = collector {
        collector.final_collect();
        debug!(?id, "thread collector torn down");
    }
}

pub(crate) fn register_owner(id: ObjectId, owner: Weak<GarbageCollector>) {
    REGISTRY.owners.insert(id, owner);
}

pub(crate) fn unregister_owner(id: ObjectId) {
    REGISTRY.owners.remove(&id);
}

pub(crate) fn owner_of(id: ObjectId) -> Option<Arc<GarbageCollector>> {
    REGISTRY.owners.get(&id).and_then(|entry| entry.upgrade())
}
