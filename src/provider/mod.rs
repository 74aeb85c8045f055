//! Providers: composable bundles of pending factories and seed values.
//!
//! A provider is resolved by repeatedly picking the first solvable pending
//! factory, building it from what is already resolved and recording its
//! release on a teardown stack. The pass ends when nothing is pending; the
//! stack is unwound in reverse when the caller is done, or as soon as an
//! acquisition fails.

use std::fmt;
use std::sync::Arc;

use crate::collection::ProviderModule;
use crate::config::ResolveConfig;
use crate::error::DiResult;
use crate::factory::{AnyArc, Factory, Producer, Scoped, SyncFactory};
use crate::graph_export::ProviderGraph;
use crate::internal::TeardownStack;
use crate::key::{key_of_type, named_key_of_type, Key};
use crate::observer::DiObserver;

mod async_provider;
mod container;
mod merge;
mod scope;
mod state;

pub use async_provider::AsyncProvider;
pub use container::Container;
pub use scope::{AsyncResolvedScope, ResolvedScope};

use state::ProviderState;

/// A synchronous provider.
///
/// Registration (`include*`, `with_*`) is the only mutation; building never
/// changes the provider, so it can be built any number of times and every
/// pass acquires fresh instances. `Clone` yields an independent copy.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, Scoped};
/// use std::sync::{Arc, Mutex};
///
/// struct Settings { url: String }
/// struct Pool { url: String }
/// struct Repository { pool: Arc<Pool> }
///
/// let log = Arc::new(Mutex::new(Vec::new()));
/// let pool_log = log.clone();
///
/// let mut provider = Provider::new().with_value(Settings { url: "postgres://db".into() });
/// provider
///     .include_scoped(move |s: Arc<Settings>| {
///         pool_log.lock().unwrap().push("open pool");
///         let log = pool_log.clone();
///         Ok(Scoped::new(Pool { url: s.url.clone() })
///             .on_release(move |_| log.lock().unwrap().push("close pool")))
///     })?
///     .include(|pool: Arc<Pool>| Repository { pool })?;
///
/// let url = provider.build(|c| c.require::<Repository>().map(|r| r.pool.url.clone()))??;
/// assert_eq!(url, "postgres://db");
/// assert_eq!(*log.lock().unwrap(), vec!["open pool", "close pool"]);
/// # Ok::<(), ferrous_scope::DiError>(())
/// ```
#[derive(Clone, Default)]
pub struct Provider {
    pub(crate) state: ProviderState<SyncFactory>,
}

impl Provider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with seed values only.
    ///
    /// ```
    /// use ferrous_scope::{AnyArc, Key, Provider, key_of_type};
    /// use std::sync::Arc;
    ///
    /// let provider = Provider::from_values([
    ///     (key_of_type::<u32>(), Arc::new(1u32) as AnyArc),
    ///     (Key::Token("name"), Arc::new("ferris".to_string()) as AnyArc),
    /// ]);
    /// assert!(provider.contains(&Key::Token("name")));
    /// ```
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (Key, AnyArc)>,
    {
        let mut provider = Self::new();
        for (key, instance) in values {
            provider.state.insert_value(key, instance);
        }
        provider
    }

    /// Creates a provider holding a single plain producer.
    pub fn from_factory<Args, T, F>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let mut provider = Self::new();
        provider.include(producer)?;
        Ok(provider)
    }

    /// Creates a provider holding a single scoped producer.
    pub fn from_scoped_factory<Args, T, F>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, DiResult<Scoped<T>>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let mut provider = Self::new();
        provider.include_scoped(producer)?;
        Ok(provider)
    }

    /// Registers a plain producer.
    ///
    /// Replaces any factory or seed value registered for the same key.
    pub fn include<Args, T, F>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory = SyncFactory::from_fn(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers a scoped producer.
    pub fn include_scoped<Args, T, F>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, DiResult<Scoped<T>>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory = SyncFactory::from_scoped(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers a plain producer under `name`.
    pub fn include_named<Args, T, F>(&mut self, name: &'static str, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory = SyncFactory::from_fn(producer)?.named(name);
        Ok(self.include_factory(factory))
    }

    /// Registers an already assembled factory.
    pub fn include_factory(&mut self, factory: SyncFactory) -> &mut Self {
        tracing::trace!(key = %factory.key(), shape = ?factory.shape(), "registered factory");
        self.state.include(factory);
        self
    }

    /// Adds a seed value keyed by its type.
    ///
    /// Replaces any factory or value registered for the same key.
    pub fn with_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.with_keyed_value(key_of_type::<T>(), value)
    }

    /// Adds a seed value keyed by its type and `name`.
    pub fn with_named_value<T: Send + Sync + 'static>(self, name: &'static str, value: T) -> Self {
        self.with_keyed_value(named_key_of_type::<T>(name), value)
    }

    /// Adds a seed value under an explicit key.
    pub fn with_keyed_value<T: Send + Sync + 'static>(mut self, key: Key, value: T) -> Self {
        self.state.insert_value(key, Arc::new(value));
        self
    }

    /// Builder form of [`include_factory`](Self::include_factory).
    pub fn with_factory(mut self, factory: SyncFactory) -> Self {
        self.include_factory(factory);
        self
    }

    /// Replaces the resolution configuration.
    pub fn with_config(mut self, config: ResolveConfig) -> Self {
        self.state.config = config;
        self
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.state.config
    }

    /// Attaches an observer to every future build pass.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.state.observers.add(observer);
        self
    }

    /// Applies a module's registrations.
    pub fn add_module<M: ProviderModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    /// Whether `key` is pending or seeded.
    pub fn contains(&self, key: &Key) -> bool {
        self.state.contains(key)
    }

    /// Snapshot of the pending factories and seed values.
    pub fn describe(&self) -> ProviderGraph {
        self.state.describe()
    }

    /// Right-biased merge; same as `self | other`.
    pub fn merge(&self, other: &Provider) -> Provider {
        Provider {
            state: self.state.merge(&other.state),
        }
    }

    /// Lifts every factory to its asynchronous form.
    pub fn into_async(self) -> AsyncProvider {
        AsyncProvider {
            state: self.state.into_async(),
        }
    }

    /// Resolves every pending factory and returns the open scope.
    ///
    /// On failure, every acquisition made so far is released in reverse
    /// order before the error is returned.
    pub fn enter(&self) -> DiResult<ResolvedScope> {
        let span = tracing::debug_span!(
            "build",
            pending = self.state.pending.len(),
            seeded = self.state.seed.len()
        );
        let _guard = span.enter();

        let mut pending = self.state.pending.clone();
        let mut resolved = self.state.seed.clone();
        let mut teardown = TeardownStack::new(self.state.observers.clone());

        while !pending.is_empty() {
            let factory = match self.state.next_solvable(&pending, &resolved) {
                Some(factory) => factory,
                None => return Err(self.state.unresolved(&pending)),
            };
            let key = *factory.key();
            let started = self.state.acquiring(&key);
            let acquired = match resolved.solve(&factory) {
                Ok(acquired) => acquired,
                Err(e) => {
                    self.state.failed(&key, &e);
                    return Err(e);
                }
            };
            self.state.acquired(&key, started);
            teardown.push(key, acquired.release);
            pending.remove(&key);
            resolved = resolved.with_instance(key, acquired.instance);
        }

        Ok(ResolvedScope::new(Container::new(resolved), teardown))
    }

    /// Resolves, runs `f` with the container, then releases everything in
    /// reverse acquisition order.
    ///
    /// A panic in `f` still releases everything while unwinding.
    pub fn build<R, F>(&self, f: F) -> DiResult<R>
    where
        F: FnOnce(&Container) -> R,
    {
        let scope = self.enter()?;
        let result = f(scope.container());
        scope.close();
        Ok(result)
    }

    /// Human-readable listing of pending factories and seed values.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        debug_listing("Provider", &self.describe())
    }
}

#[cfg(feature = "diagnostics")]
pub(crate) fn debug_listing(title: &str, graph: &ProviderGraph) -> String {
    use crate::graph_export::NodeState;

    let mut s = String::new();
    s.push_str(&format!("=== {} Debug ===\n", title));
    s.push_str("Pending:\n");
    for node in graph.nodes.iter().filter(|n| n.state == NodeState::Pending) {
        s.push_str(&format!("  {} <- [{}] {:?}\n", node.key, node.inputs.join(", "), node.shape));
    }
    s.push_str("Seeded:\n");
    for node in graph.nodes.iter().filter(|n| n.state == NodeState::Seeded) {
        s.push_str(&format!("  {}\n", node.key));
    }
    s
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("pending", &self.state.pending)
            .field("seed", &self.state.seed)
            .field("config", &self.state.config)
            .finish()
    }
}
