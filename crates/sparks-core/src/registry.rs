//! # Singleton Registry
//!
//! A type-keyed store handing out exactly one shared instance per type.
//!
//! ## Lifecycle of an Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Registry Cell Lifecycle                              │
//! │                                                                         │
//! │  get::<CurrentEmployee>()        (no entry yet)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrentEmployee::default() ──► stored ──► Arc A returned              │
//! │                                                                         │
//! │  get::<CurrentEmployee>()        ──► same Arc A                        │
//! │                                                                         │
//! │  rebind(CurrentEmployee::signed_in(alice))   (after login)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Arc B replaces Arc A ──► get() now returns Arc B                      │
//! │  (holders of Arc A keep a consistent, older snapshot)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! One `RwLock` guards the whole map. Lookups take the read lock; creation and
//! rebinding take the write lock, so a rebind is atomic with respect to every
//! concurrent `get`. A poisoned lock is recovered: every operation leaves the
//! map consistent before it can panic.
//!
//! ## Construction
//! `get` requires `T: Default`, so asking for a type with no zero-argument
//! constructor is rejected at compile time. Infrastructure without a default
//! (a storage facade needs a store) is bound explicitly with [`Registry::rebind`]
//! and fetched with [`Registry::require`], which panics when nothing was bound.
//! `Default` implementations of registered types must not call back into the
//! same registry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::debug;

type Instance = Arc<dyn Any + Send + Sync>;

/// Process-wide, type-keyed, rebindable instance store.
#[derive(Default)]
pub struct Registry {
    cells: RwLock<HashMap<TypeId, Instance>>,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// Services receive the registry they should use; tests build their own.
    pub fn new() -> Self {
        Registry::default()
    }

    /// The registry shared by the whole process.
    pub fn global() -> Arc<Registry> {
        static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Registry::new())).clone()
    }

    /// Returns the instance for `T`, default-constructing it on first use.
    pub fn get<T>(&self) -> Arc<T>
    where
        T: Default + Send + Sync + 'static,
    {
        if let Some(existing) = self.try_get::<T>() {
            return existing;
        }

        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have created it between the two locks.
        let instance = cells
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                debug!(ty = type_name::<T>(), "Creating registry instance");
                Arc::new(T::default()) as Instance
            })
            .clone();
        downcast(instance)
    }

    /// Replaces the instance for `T` with `value` and returns it.
    pub fn rebind<T>(&self, value: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        self.rebind_shared(Arc::new(value))
    }

    /// Like [`Registry::rebind`] for a value that is already shared.
    pub fn rebind_shared<T>(&self, value: Arc<T>) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = cells.insert(TypeId::of::<T>(), value.clone()).is_some();
        debug!(ty = type_name::<T>(), replaced, "Rebound registry instance");
        value
    }

    /// Returns the instance for `T` without creating one.
    pub fn try_get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.get(&TypeId::of::<T>()).cloned().map(downcast)
    }

    /// Returns the instance for `T`.
    ///
    /// ## Panics
    /// When nothing was bound for `T`. Infrastructure is bound at startup, so
    /// a missing entry is a wiring mistake.
    pub fn require<T>(&self) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        self.try_get::<T>().unwrap_or_else(|| {
            panic!(
                "no instance of {} is bound in the registry",
                type_name::<T>()
            )
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.contains_key(&TypeId::of::<T>())
    }

    /// Number of bound types.
    pub fn len(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.len())
            .finish()
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Arc<T> {
    match instance.downcast::<T>() {
        Ok(typed) => typed,
        // Entries are keyed by TypeId::of::<T>, so the cast cannot fail.
        Err(_) => unreachable!("registry entry for {} has another type", type_name::<T>()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[derive(Debug, Default, PartialEq)]
    struct Counter(u32);

    #[derive(Debug, PartialEq)]
    struct Service {
        name: &'static str,
    }

    #[test]
    fn test_get_returns_identical_instance() {
        let registry = Registry::new();
        let first = registry.get::<Counter>();
        let second = registry.get::<Counter>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rebind_then_get_returns_rebound() {
        let registry = Registry::new();
        let original = registry.get::<Counter>();
        let rebound = registry.rebind(Counter(9));

        let fetched = registry.get::<Counter>();
        assert!(Arc::ptr_eq(&rebound, &fetched));
        assert!(!Arc::ptr_eq(&original, &fetched));
        assert_eq!(*fetched, Counter(9));
        // Earlier holders keep their snapshot.
        assert_eq!(*original, Counter(0));
    }

    #[test]
    fn test_require_and_try_get() {
        let registry = Registry::new();
        assert!(registry.try_get::<Service>().is_none());
        assert!(!registry.contains::<Service>());

        registry.rebind(Service { name: "facade" });
        assert_eq!(registry.require::<Service>().name, "facade");
        assert!(registry.contains::<Service>());
    }

    #[test]
    #[should_panic(expected = "is bound in the registry")]
    fn test_require_missing_panics() {
        Registry::new().require::<Service>();
    }

    #[test]
    fn test_types_are_isolated() {
        let registry = Registry::new();
        registry.rebind(Counter(1));
        registry.rebind(String::from("session"));
        assert_eq!(*registry.get::<Counter>(), Counter(1));
        assert_eq!(registry.get::<String>().as_str(), "session");
    }

    #[test]
    fn test_concurrent_get_creates_once() {
        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Default for Tracked {
            fn default() -> Self {
                CREATED.fetch_add(1, Ordering::SeqCst);
                Tracked
            }
        }

        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.get::<Tracked>())
            })
            .collect();

        let instances: Vec<Arc<Tracked>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&Registry::global(), &Registry::global()));
    }
}
