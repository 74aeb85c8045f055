//! Read-only view over a fully resolved set.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::DiResult;
use crate::factory::AnyArc;
use crate::key::Key;
use crate::resolved::ResolvedSet;
use crate::traits::Resolver;

/// The resolved services handed to the caller of a build.
///
/// A `Container` is cheap to clone and never changes: it only exposes
/// lookups. The typed helpers mirror the [`Resolver`] trait so they work
/// without importing it.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, named_key_of_type};
/// use std::sync::Arc;
///
/// struct Port(u16);
///
/// let mut provider = Provider::new().with_value(Port(8080));
/// provider.include(|p: Arc<Port>| format!("listening on {}", p.0)).unwrap();
///
/// provider.build(|container| {
///     assert_eq!(*container.require::<String>().unwrap(), "listening on 8080");
///     assert_eq!(container.len(), 2);
///     assert!(container.get_key(&named_key_of_type::<Port>("admin")).is_none());
/// }).unwrap();
/// ```
#[derive(Clone, Default)]
pub struct Container {
    resolved: ResolvedSet,
}

impl Container {
    pub(crate) fn new(resolved: ResolvedSet) -> Self {
        Self { resolved }
    }

    /// Instance of `T`, or `None`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Resolver::get::<T>(self)
    }

    /// Instance of `T`, failing with `NotFound` when absent.
    pub fn require<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        Resolver::require::<T>(self)
    }

    /// Instance of `T` registered under `name`, or `None`.
    pub fn get_named<T: Send + Sync + 'static>(&self, name: &'static str) -> Option<Arc<T>> {
        Resolver::get_named::<T>(self, name)
    }

    /// Instance of `T` registered under `name`, failing with `NotFound`.
    pub fn require_named<T: Send + Sync + 'static>(&self, name: &'static str) -> DiResult<Arc<T>> {
        Resolver::require_named::<T>(self, name)
    }

    /// Type-erased instance stored under `key`, or `None`.
    pub fn get_key(&self, key: &Key) -> Option<AnyArc> {
        self.resolved.get(key).cloned()
    }

    /// Type-erased instance stored under `key`, failing with `NotFound`.
    pub fn require_key(&self, key: &Key) -> DiResult<AnyArc> {
        Resolver::require_key(self, key)
    }

    /// Every resolved key.
    pub fn keys(&self) -> HashSet<Key> {
        self.resolved.key_set()
    }

    /// Whether an instance of `T` is resolved.
    pub fn contains<T: 'static>(&self) -> bool {
        Resolver::contains::<T>(self)
    }

    /// Whether `key` is resolved.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.resolved.contains(key)
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl Resolver for Container {
    fn lookup(&self, key: &Key) -> Option<AnyArc> {
        self.resolved.get(key).cloned()
    }

    fn keys(&self) -> HashSet<Key> {
        self.resolved.key_set()
    }

    fn contains_key(&self, key: &Key) -> bool {
        self.resolved.contains(key)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Container({:?})", self.resolved)
    }
}
