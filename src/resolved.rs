//! Resolved sets: the already-built half of a provider.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::{Acquired, AnyArc, AsyncAcquired, AsyncFactory, Factory, SyncFactory};
use crate::key::Key;

#[cfg(feature = "ahash")]
type Map = std::collections::HashMap<Key, AnyArc, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type Map = std::collections::HashMap<Key, AnyArc>;

#[cfg(feature = "smallvec")]
pub(crate) type Inputs = smallvec::SmallVec<[AnyArc; 4]>;
#[cfg(not(feature = "smallvec"))]
pub(crate) type Inputs = Vec<AnyArc>;

/// Keyed collection of built instances.
///
/// Copy-on-write: the map sits behind an `Arc`, so cloning is cheap and
/// every "update" produces a new set while earlier clones keep their view.
#[derive(Clone, Default)]
pub(crate) struct ResolvedSet {
    data: Arc<Map>,
}

impl ResolvedSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&AnyArc> {
        self.data.get(key)
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.data.contains_key(key)
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.data.keys()
    }

    pub(crate) fn key_set(&self) -> HashSet<Key> {
        self.data.keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// This set plus `key -> instance`, replacing any previous instance.
    pub(crate) fn with_instance(mut self, key: Key, instance: AnyArc) -> Self {
        Arc::make_mut(&mut self.data).insert(key, instance);
        self
    }

    /// In-place insert, for construction before any clone is shared.
    pub(crate) fn insert(&mut self, key: Key, instance: AnyArc) {
        Arc::make_mut(&mut self.data).insert(key, instance);
    }

    pub(crate) fn remove(&mut self, key: &Key) -> Option<AnyArc> {
        if !self.data.contains_key(key) {
            return None;
        }
        Arc::make_mut(&mut self.data).remove(key)
    }

    /// Right-biased union: instances from `other` win for shared keys.
    pub(crate) fn merge(&self, other: &ResolvedSet) -> ResolvedSet {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = self.clone();
        let data = Arc::make_mut(&mut merged.data);
        for (key, instance) in other.data.iter() {
            data.insert(*key, instance.clone());
        }
        merged
    }

    /// Drops every instance whose key appears in `keys`.
    pub(crate) fn remove_keys_present_in<'a>(mut self, keys: impl IntoIterator<Item = &'a Key>) -> Self {
        for key in keys {
            self.remove(key);
        }
        self
    }

    /// True iff every input of `factory` is resolved.
    pub(crate) fn is_solvable<F: Factory>(&self, factory: &F) -> bool {
        factory.inputs().iter().all(|k| self.contains(k))
    }

    fn gather(&self, inputs: &[Key]) -> DiResult<Inputs> {
        inputs
            .iter()
            .map(|k| self.get(k).cloned().ok_or(DiError::NotFound(k.display_name())))
            .collect()
    }

    /// Builds `factory` from the resolved inputs.
    ///
    /// The returned acquisition's release is owed by the caller, who must
    /// run it only after everything built on top of the instance is gone.
    pub(crate) fn solve(&self, factory: &SyncFactory) -> DiResult<Acquired> {
        let args = self.gather(factory.inputs())?;
        factory
            .run(&args)
            .map_err(|e| e.with_key(factory.key().display_name()))
    }

    /// Async counterpart of [`solve`](Self::solve).
    pub(crate) async fn solve_async(&self, factory: &AsyncFactory) -> DiResult<AsyncAcquired> {
        let args = self.gather(factory.inputs())?;
        factory
            .run(&args)
            .await
            .map_err(|e| e.with_key(factory.key().display_name()))
    }
}

impl fmt::Debug for ResolvedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&Key> = self.data.keys().collect();
        keys.sort();
        f.write_str("{")?;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", key)?;
        }
        f.write_str("}")
    }
}
