//! Resolver trait for typed lookups in a resolved container.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;
use crate::key::{key_of_type, named_key_of_type, Key};

/// Read-only lookup interface over resolved instances.
///
/// Only [`lookup`](Self::lookup) and [`keys`](Self::keys) are required; the
/// typed helpers are built on them. [`Container`](crate::Container) implements
/// this trait, and the build scopes expose it by dereferencing to their
/// container.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, Resolver, DiError};
///
/// let provider = Provider::new().with_value(42u32);
/// provider.build(|container| {
///     assert_eq!(*container.require::<u32>().unwrap(), 42);
///     assert!(container.get::<u64>().is_none());
///     assert!(matches!(container.require::<u64>(), Err(DiError::NotFound(_))));
/// }).unwrap();
/// ```
pub trait Resolver {
    /// Looks up the type-erased instance stored under `key`.
    fn lookup(&self, key: &Key) -> Option<AnyArc>;

    /// The set of keys currently resolved.
    fn keys(&self) -> HashSet<Key>;

    /// Whether `key` is resolved.
    fn contains_key(&self, key: &Key) -> bool {
        self.lookup(key).is_some()
    }

    /// Looks up the instance stored under `key`, failing with `NotFound`.
    fn require_key(&self, key: &Key) -> DiResult<AnyArc> {
        self.lookup(key).ok_or(DiError::NotFound(key.display_name()))
    }

    /// Looks up and downcasts the instance stored under `key`.
    fn require_as<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Arc<T>> {
        self.require_key(key)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Resolved instance of `T`, or `None`.
    fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.require::<T>().ok()
    }

    /// Resolved instance of `T`, failing with `NotFound` when absent.
    fn require<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.require_as::<T>(&key_of_type::<T>())
    }

    /// Resolved instance of `T` registered under `name`, or `None`.
    fn get_named<T: Send + Sync + 'static>(&self, name: &'static str) -> Option<Arc<T>> {
        self.require_named::<T>(name).ok()
    }

    /// Resolved instance of `T` registered under `name`, failing with `NotFound`.
    fn require_named<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        self.require_as::<T>(&named_key_of_type::<T>(name))
    }

    /// Whether an instance of `T` is resolved.
    fn contains<T: 'static>(&self) -> bool {
        self.contains_key(&key_of_type::<T>())
    }
}
