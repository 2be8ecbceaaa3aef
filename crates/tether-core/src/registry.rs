#![forbid(unsafe_code)]

//! Manager-owned binding table.
//!
//! A [`BindingRegistry`] is the lifecycle authority for bindings whose
//! ownership was transferred away from the caller. It keeps each adopted
//! entry alive until the entry is unbound, released through the registry,
//! or the registry itself goes away.
//!
//! Every [`Object`](crate::object::Object) embeds one registry, so a binding
//! managed by its source object lives exactly as long as that object. A
//! per-thread [`BindingRegistry::global`] table covers bindings created from
//! bare properties.
//!
//! # Invariants
//!
//! 1. An id is present at most once.
//! 2. No registry borrow is held while an entry's `release()` runs, so an
//!    entry may call back into the registry (e.g. [`BindingRegistry::forget`])
//!    while being torn down.
//! 3. Dropping the last handle to a registry releases everything it holds.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "tracing")]
use crate::logging::{debug, trace};

/// Process-unique binding identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding#{}", self.0)
    }
}

/// An entry a registry can own and tear down.
pub trait ManagedBinding {
    /// Identifier the registry files the entry under.
    fn id(&self) -> BindingId;

    /// Whether the entry is still synchronizing.
    fn is_bound(&self) -> bool;

    /// Tear the entry down. Must be idempotent.
    fn release(&self);
}

struct RegistryInner {
    entries: RefCell<HashMap<BindingId, Rc<dyn ManagedBinding>>>,
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        let entries: Vec<_> = self.entries.get_mut().drain().map(|(_, e)| e).collect();
        #[cfg(feature = "tracing")]
        if !entries.is_empty() {
            debug!(count = entries.len(), "binding registry dropped, releasing entries");
        }
        for entry in entries {
            entry.release();
        }
    }
}

/// Shared handle to a table of managed bindings.
///
/// Cloning shares the same table.
#[derive(Clone)]
pub struct BindingRegistry {
    inner: Rc<RegistryInner>,
}

/// Non-owning handle to a [`BindingRegistry`].
#[derive(Clone)]
pub struct WeakBindingRegistry {
    inner: Weak<RegistryInner>,
}

impl WeakBindingRegistry {
    /// Upgrade to a strong handle if the registry is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<BindingRegistry> {
        self.inner.upgrade().map(|inner| BindingRegistry { inner })
    }
}

impl fmt::Debug for WeakBindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakBindingRegistry")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("len", &self.inner.entries.borrow().len())
            .finish()
    }
}

thread_local! {
    static GLOBAL: BindingRegistry = BindingRegistry::new();
}

impl BindingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                entries: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The calling thread's fallback registry.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.with(Clone::clone)
    }

    /// Take ownership of `entry`. Adopting an id twice keeps the first entry.
    pub fn adopt(&self, entry: Rc<dyn ManagedBinding>) -> BindingId {
        let id = entry.id();
        self.inner.entries.borrow_mut().entry(id).or_insert(entry);
        #[cfg(feature = "tracing")]
        trace!(%id, "binding adopted by registry");
        id
    }

    /// Whether `id` is currently held.
    #[must_use]
    pub fn contains(&self, id: BindingId) -> bool {
        self.inner.entries.borrow().contains_key(&id)
    }

    /// Number of held entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Whether the registry holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    /// Ids of held entries, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<BindingId> {
        let mut ids: Vec<_> = self.inner.entries.borrow().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Remove `id` and tear it down. Returns `false` if it was not held.
    pub fn release(&self, id: BindingId) -> bool {
        let entry = self.inner.entries.borrow_mut().remove(&id);
        match entry {
            Some(entry) => {
                entry.release();
                true
            }
            None => false,
        }
    }

    /// Remove `id` without tearing it down.
    ///
    /// Entries call this on themselves when unbound through another path.
    pub fn forget(&self, id: BindingId) -> bool {
        let entry = self.inner.entries.borrow_mut().remove(&id);
        entry.is_some()
    }

    /// Release every held entry.
    pub fn clear(&self) {
        let entries: Vec<_> = self
            .inner
            .entries
            .borrow_mut()
            .drain()
            .map(|(_, e)| e)
            .collect();
        for entry in entries {
            entry.release();
        }
    }

    /// Drop entries that were unbound without going through the registry.
    pub fn prune(&self) -> usize {
        let mut entries = self.inner.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, e| e.is_bound());
        before - entries.len()
    }

    /// Non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakBindingRegistry {
        WeakBindingRegistry {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles share a table.
    #[must_use]
    pub fn ptr_eq(&self, other: &BindingRegistry) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubEntry {
        id: BindingId,
        bound: Cell<bool>,
        releases: Rc<Cell<u32>>,
    }

    impl StubEntry {
        fn new(releases: &Rc<Cell<u32>>) -> Rc<Self> {
            Rc::new(Self {
                id: BindingId::next(),
                bound: Cell::new(true),
                releases: Rc::clone(releases),
            })
        }
    }

    impl ManagedBinding for StubEntry {
        fn id(&self) -> BindingId {
            self.id
        }

        fn is_bound(&self) -> bool {
            self.bound.get()
        }

        fn release(&self) {
            if self.bound.replace(false) {
                self.releases.set(self.releases.get() + 1);
            }
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = BindingId::next();
        let b = BindingId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn adopt_and_release() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let stub = StubEntry::new(&releases);
        let id = registry.adopt(stub.clone());

        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);

        assert!(registry.release(id));
        assert!(!stub.is_bound());
        assert_eq!(releases.get(), 1);
        assert!(registry.is_empty());

        assert!(!registry.release(id));
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn adopt_twice_keeps_one_entry() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let stub = StubEntry::new(&releases);
        registry.adopt(stub.clone());
        registry.adopt(stub);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn forget_does_not_release() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let stub = StubEntry::new(&releases);
        let id = registry.adopt(stub.clone());

        assert!(registry.forget(id));
        assert!(stub.is_bound());
        assert_eq!(releases.get(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        registry.adopt(StubEntry::new(&releases));
        registry.adopt(StubEntry::new(&releases));

        registry.clear();
        assert_eq!(releases.get(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn dropping_last_handle_releases_entries() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let weak = registry.downgrade();
        let clone = registry.clone();
        registry.adopt(StubEntry::new(&releases));

        drop(registry);
        assert_eq!(releases.get(), 0);
        assert!(weak.upgrade().is_some());

        drop(clone);
        assert_eq!(releases.get(), 1);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn prune_drops_unbound_entries() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let stub = StubEntry::new(&releases);
        registry.adopt(stub.clone());
        registry.adopt(StubEntry::new(&releases));

        stub.release();
        assert_eq!(registry.prune(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn global_is_shared_per_thread() {
        assert!(BindingRegistry::global().ptr_eq(&BindingRegistry::global()));
        assert!(!BindingRegistry::global().ptr_eq(&BindingRegistry::new()));
    }

    #[test]
    fn ids_sorted() {
        let releases = Rc::new(Cell::new(0));
        let registry = BindingRegistry::new();
        let a = registry.adopt(StubEntry::new(&releases));
        let b = registry.adopt(StubEntry::new(&releases));
        assert_eq!(registry.ids(), vec![a, b]);
    }
}
