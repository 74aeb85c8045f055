//! Factory groups: the pending half of a provider.
//!
//! A `FactoryGroup` keeps factories in registration order, which is the
//! default order in which the resolution engine scans for the next
//! solvable factory.

use std::fmt;

use crate::factory::{AsyncFactory, Factory, SyncFactory};
use crate::key::Key;

pub mod module_system;
pub use module_system::*;

/// Keyed, registration-ordered collection of not-yet-resolved factories.
///
/// Backed by a `Vec`: groups are small and scanned front to back on every
/// resolution step, so linear search beats hashing here.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{FactoryGroup, SyncFactory, key_of_type};
///
/// let mut left = FactoryGroup::new();
/// left.register(SyncFactory::from_fn(|| 1u8).unwrap());
/// left.register(SyncFactory::from_fn(|| 2u16).unwrap());
///
/// let mut right = FactoryGroup::new();
/// right.register(SyncFactory::from_fn(|| 3u8).unwrap());
///
/// let merged = left.merge(&right);
/// assert_eq!(merged.len(), 2);
/// assert_eq!(merged.keys().next(), Some(&key_of_type::<u8>()));
/// ```
#[derive(Clone)]
pub struct FactoryGroup<F: Factory = SyncFactory> {
    entries: Vec<F>,
}

impl<F: Factory> FactoryGroup<F> {
    /// Creates an empty group.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts a factory, replacing any same-key factory in its slot.
    pub fn register(&mut self, factory: F) {
        match self.position(factory.key()) {
            Some(pos) => self.entries[pos] = factory,
            None => self.entries.push(factory),
        }
    }

    /// Removes the factory for `key`; does nothing when absent.
    pub fn remove(&mut self, key: &Key) -> Option<F> {
        self.position(key).map(|pos| self.entries.remove(pos))
    }

    /// Copy of this group without `key`.
    pub fn without(&self, key: &Key) -> Self {
        let mut next = self.clone();
        next.remove(key);
        next
    }

    /// Right-biased union: factories from `other` win for shared keys.
    ///
    /// Shared keys keep the slot they had in `self`; keys new to `self`
    /// follow in `other`'s order.
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for factory in &other.entries {
            merged.register(factory.clone());
        }
        merged
    }

    /// Factory registered for `key`.
    pub fn get(&self, key: &Key) -> Option<&F> {
        self.entries.iter().find(|f| f.key() == key)
    }

    /// Whether a factory is registered for `key`.
    pub fn contains(&self, key: &Key) -> bool {
        self.position(key).is_some()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|f| f.key())
    }

    /// Factories in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &Key) -> Option<usize> {
        self.entries.iter().position(|f| f.key() == key)
    }
}

impl FactoryGroup<SyncFactory> {
    /// Lifts every factory to its asynchronous form, keeping the order.
    pub fn into_async(self) -> FactoryGroup<AsyncFactory> {
        FactoryGroup {
            entries: self.entries.into_iter().map(SyncFactory::into_async).collect(),
        }
    }
}

impl<F: Factory> Default for FactoryGroup<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Factory> FromIterator<F> for FactoryGroup<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        let mut group = Self::new();
        for factory in iter {
            group.register(factory);
        }
        group
    }
}

impl<F: Factory> fmt::Debug for FactoryGroup<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys().map(ToString::to_string))
            .finish()
    }
}
