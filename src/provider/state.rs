//! The `(pending, seed)` pair shared by sync and async providers, plus the
//! scan step of the resolution loop.

use std::time::Instant;

use crate::collection::FactoryGroup;
use crate::config::{ResolveConfig, ScanOrder};
use crate::error::DiError;
use crate::factory::{AnyArc, AsyncFactory, Factory, SyncFactory};
use crate::graph_export::{GraphNode, NodeState, ProviderGraph};
use crate::key::Key;
use crate::observer::Observers;
use crate::resolved::ResolvedSet;

/// Pending factories and seed values of a provider.
///
/// `pending` and `seed` never share a key: every registration on one side
/// evicts the key from the other.
#[derive(Clone)]
pub(crate) struct ProviderState<F: Factory> {
    pub(crate) pending: FactoryGroup<F>,
    pub(crate) seed: ResolvedSet,
    pub(crate) observers: Observers,
    pub(crate) config: ResolveConfig,
}

impl<F: Factory> ProviderState<F> {
    pub(crate) fn new() -> Self {
        Self {
            pending: FactoryGroup::new(),
            seed: ResolvedSet::new(),
            observers: Observers::new(),
            config: ResolveConfig::default(),
        }
    }

    pub(crate) fn include(&mut self, factory: F) {
        self.seed.remove(factory.key());
        self.pending.register(factory);
    }

    pub(crate) fn insert_value(&mut self, key: Key, instance: AnyArc) {
        self.pending.remove(&key);
        self.seed.insert(key, instance);
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.pending.contains(key) || self.seed.contains(key)
    }

    /// Combines two states; see the `|` operator on providers for the
    /// precedence rules.
    pub(crate) fn merge(&self, other: &Self) -> Self {
        let pending = self.pending.merge(&other.pending);
        let seed = self.seed.merge(&other.seed).remove_keys_present_in(pending.keys());
        Self {
            pending,
            seed,
            observers: self.observers.merged(&other.observers),
            config: self.config.clone(),
        }
    }

    /// First factory in `pending` whose inputs are all in `resolved`.
    pub(crate) fn next_solvable(&self, pending: &FactoryGroup<F>, resolved: &ResolvedSet) -> Option<F> {
        let mut solvable = pending.iter().filter(|f| resolved.is_solvable(*f));
        let next = match self.config.scan_order {
            ScanOrder::Registration => solvable.next(),
            ScanOrder::KeyOrder => solvable.min_by(|a, b| a.key().cmp(b.key())),
        };
        if self.config.trace_steps {
            match next {
                Some(factory) => tracing::trace!(
                    key = %factory.key(),
                    pending = pending.len(),
                    "selected solvable factory"
                ),
                None => tracing::trace!(pending = pending.len(), "no solvable factory"),
            }
        }
        next.cloned()
    }

    /// Reports a pass that stopped with `pending` left over.
    pub(crate) fn unresolved(&self, pending: &FactoryGroup<F>) -> DiError {
        let keys: Vec<Key> = pending.keys().copied().collect();
        let names: Vec<String> = keys.iter().map(ToString::to_string).collect();
        tracing::warn!(pending = ?names, "no pending factory is solvable");
        self.observers.unresolved(&keys);
        DiError::Unresolved(keys.iter().map(Key::display_name).collect())
    }

    pub(crate) fn acquiring(&self, key: &Key) -> Instant {
        tracing::debug!(key = %key, "acquiring");
        self.observers.acquiring(key);
        Instant::now()
    }

    pub(crate) fn acquired(&self, key: &Key, started: Instant) {
        let elapsed = started.elapsed();
        tracing::debug!(key = %key, elapsed_us = elapsed.as_micros() as u64, "acquired");
        self.observers.acquired(key, elapsed);
    }

    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        tracing::debug!(key = %key, error = %error, "acquisition failed; unwinding");
        self.observers.failed(key, error);
    }

    pub(crate) fn describe(&self) -> ProviderGraph {
        let mut nodes: Vec<GraphNode> = self
            .pending
            .iter()
            .map(|f| GraphNode {
                key: f.key().to_string(),
                state: NodeState::Pending,
                inputs: f.inputs().iter().map(ToString::to_string).collect(),
                shape: Some(f.shape()),
            })
            .collect();
        let mut seeded: Vec<&Key> = self.seed.keys().collect();
        seeded.sort();
        nodes.extend(seeded.into_iter().map(|k| GraphNode {
            key: k.to_string(),
            state: NodeState::Seeded,
            inputs: Vec::new(),
            shape: None,
        }));
        ProviderGraph { nodes }
    }
}

impl ProviderState<SyncFactory> {
    pub(crate) fn into_async(self) -> ProviderState<AsyncFactory> {
        ProviderState {
            pending: self.pending.into_async(),
            seed: self.seed,
            observers: self.observers,
            config: self.config,
        }
    }
}

impl<F: Factory> Default for ProviderState<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;
    use std::sync::Arc;

    fn state(factories: Vec<SyncFactory>) -> ProviderState<SyncFactory> {
        let mut state = ProviderState::new();
        for f in factories {
            state.include(f);
        }
        state
    }

    #[test]
    fn include_and_insert_keep_sides_disjoint() {
        let mut s = ProviderState::<SyncFactory>::new();
        s.insert_value(key_of_type::<u8>(), Arc::new(1u8));
        s.include(SyncFactory::from_fn(|| 2u8).unwrap());
        assert!(s.pending.contains(&key_of_type::<u8>()));
        assert!(!s.seed.contains(&key_of_type::<u8>()));

        s.insert_value(key_of_type::<u8>(), Arc::new(3u8));
        assert!(s.pending.is_empty());
        assert!(s.contains(&key_of_type::<u8>()));
    }

    #[test]
    fn merge_prefers_factories_over_values_on_either_side() {
        let mut with_value = ProviderState::<SyncFactory>::new();
        with_value.insert_value(key_of_type::<u8>(), Arc::new(1u8));
        let with_factory = state(vec![SyncFactory::from_fn(|| 2u8).unwrap()]);

        for merged in [with_value.merge(&with_factory), with_factory.merge(&with_value)] {
            assert!(merged.pending.contains(&key_of_type::<u8>()));
            assert!(merged.seed.is_empty());
        }
    }

    #[test]
    fn key_order_picks_smallest_solvable_key() {
        let mut s = state(vec![
            SyncFactory::from_fn(|| 1u32).unwrap(),
            SyncFactory::from_fn(|| 1u16).unwrap(),
            SyncFactory::from_fn(|_: Arc<u8>| 1i8).unwrap(),
        ]);
        let resolved = ResolvedSet::new();
        let first = s.next_solvable(&s.pending, &resolved).unwrap();
        assert_eq!(first.key(), &key_of_type::<u32>());

        s.config = ResolveConfig::default().scan_order(ScanOrder::KeyOrder);
        let first = s.next_solvable(&s.pending, &resolved).unwrap();
        assert_eq!(first.key(), &key_of_type::<u16>());
    }

    #[test]
    fn unresolved_lists_every_pending_key() {
        let s = state(vec![
            SyncFactory::from_fn(|_: Arc<u16>| 1u8).unwrap(),
            SyncFactory::from_fn(|_: Arc<u8>| 1u16).unwrap(),
        ]);
        assert!(s.next_solvable(&s.pending, &ResolvedSet::new()).is_none());
        match s.unresolved(&s.pending) {
            DiError::Unresolved(names) => assert_eq!(names, vec!["u8", "u16"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
