//! Namespace Lock Module
//!
//! Per-namespace mutual exclusion for compound cache operations.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};

// == Namespace Locks ==
/// Process-wide registry of advisory namespace locks.
///
/// Each namespace gets exactly one lock, created lazily the first time a
/// cache binds to it. A cache operation holds its namespace lock for the
/// whole operation, so a sequence of store commands appears atomic to every
/// other operation on the same namespace. Operations on different
/// namespaces never contend.
///
/// The locks are tokio mutexes, which hand the lock to waiters in FIFO
/// order. Two operations on one namespace are therefore totally ordered:
/// one sees the complete effect of the other.
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    /// One lock per namespace, keyed by namespace string
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl NamespaceLocks {
    // == Constructor ==
    /// Creates an empty lock registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Lookup ==
    /// Returns the lock for a namespace, creating it on first use.
    ///
    /// Repeated calls with the same namespace return handles to the same
    /// lock, including calls racing from different tasks.
    pub fn for_namespace(&self, namespace: &str) -> Arc<Mutex<()>> {
        let entry = self
            .locks
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }

    // == Contains ==
    /// Checks whether a namespace has already been bound.
    pub fn contains(&self, namespace: &str) -> bool {
        self.locks.contains_key(namespace)
    }
}

// == Namespace Guard ==
/// Proof that a namespace lock is held.
///
/// Public cache operations acquire the lock once and thread this guard
/// through the internal operations they are composed of, so one logical
/// call chain never re-acquires its own lock. Dropping the guard releases
/// the lock, on success, error and cancellation paths alike.
pub struct NamespaceGuard<'a> {
    _held: MutexGuard<'a, ()>,
}

impl<'a> NamespaceGuard<'a> {
    /// Wraps a freshly acquired mutex guard.
    pub(crate) fn new(held: MutexGuard<'a, ()>) -> Self {
        Self { _held: held }
    }
}
