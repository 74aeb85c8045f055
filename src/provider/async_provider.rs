//! The asynchronous provider.

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use super::state::ProviderState;
use super::{AsyncResolvedScope, Container};
use crate::collection::ProviderModule;
use crate::config::ResolveConfig;
use crate::error::DiResult;
use crate::factory::{AnyArc, AsyncFactory, AsyncScoped, Factory, Producer, Scoped, SyncFactory};
use crate::graph_export::ProviderGraph;
use crate::internal::AsyncTeardownStack;
use crate::key::{key_of_type, named_key_of_type, Key};
use crate::observer::DiObserver;

/// A provider whose factories may suspend while acquiring or releasing.
///
/// Accepts every producer shape; synchronous ones are lifted on
/// registration. Resolution stays sequential: one factory at a time, in the
/// same order a [`Provider`](crate::Provider) would use.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{AsyncProvider, AsyncScoped, Provider};
/// use std::sync::Arc;
///
/// struct Settings { url: String }
/// struct Client { url: String }
///
/// # async fn example() -> ferrous_scope::DiResult<()> {
/// let settings = Provider::new().with_value(Settings { url: "https://api".into() });
///
/// let mut clients = AsyncProvider::new();
/// clients.include_async_scoped(|s: Arc<Settings>| async move {
///     Ok(AsyncScoped::new(Client { url: s.url.clone() }))
/// })?;
///
/// let provider = settings | clients;
/// let url = provider
///     .build_async(|c| async move { c.require::<Client>().map(|client| client.url.clone()) })
///     .await??;
/// assert_eq!(url, "https://api");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct AsyncProvider {
    pub(crate) state: ProviderState<AsyncFactory>,
}

impl AsyncProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider with seed values only.
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

    /// Creates a provider holding a single async producer.
    pub fn from_async_factory<Args, T, F, Fut>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let mut provider = Self::new();
        provider.include_async(producer)?;
        Ok(provider)
    }

    /// Creates a provider holding a single async scoped producer.
    pub fn from_async_scoped_factory<Args, T, F, Fut>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = DiResult<AsyncScoped<T>>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let mut provider = Self::new();
        provider.include_async_scoped(producer)?;
        Ok(provider)
    }

    /// Registers a plain synchronous producer.
    pub fn include<Args, T, F>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory = SyncFactory::from_fn(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers a synchronous scoped producer.
    pub fn include_scoped<Args, T, F>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, DiResult<Scoped<T>>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let factory = SyncFactory::from_scoped(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers an async producer returning the instance directly.
    pub fn include_async<Args, T, F, Fut>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let factory = AsyncFactory::from_async_fn(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers an async scoped producer.
    pub fn include_async_scoped<Args, T, F, Fut>(&mut self, producer: F) -> DiResult<&mut Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = DiResult<AsyncScoped<T>>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let factory = AsyncFactory::from_async_scoped(producer)?;
        Ok(self.include_factory(factory))
    }

    /// Registers an async producer under `name`.
    pub fn include_async_named<Args, T, F, Fut>(
        &mut self,
        name: &'static str,
        producer: F,
    ) -> DiResult<&mut Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let factory = AsyncFactory::from_async_fn(producer)?.named(name);
        Ok(self.include_factory(factory))
    }

    /// Registers an already assembled factory, lifting sync ones.
    pub fn include_factory(&mut self, factory: impl Into<AsyncFactory>) -> &mut Self {
        let factory = factory.into();
        tracing::trace!(key = %factory.key(), shape = ?factory.shape(), "registered factory");
        self.state.include(factory);
        self
    }

    /// Adds a seed value keyed by its type.
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

    pub fn with_factory(mut self, factory: impl Into<AsyncFactory>) -> Self {
        self.include_factory(factory);
        self
    }

    pub fn with_config(mut self, config: ResolveConfig) -> Self {
        self.state.config = config;
        self
    }

    pub fn config(&self) -> &ResolveConfig {
        &self.state.config
    }

    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.state.observers.add(observer);
        self
    }

    /// Applies a module's registrations.
    pub fn add_module<M: ProviderModule<AsyncProvider>>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register(self)?;
        Ok(self)
    }

    /// Whether `key` is pending or seeded.
    pub fn contains(&self, key: &Key) -> bool {
        self.state.contains(key)
    }

    pub fn describe(&self) -> ProviderGraph {
        self.state.describe()
    }

    /// Right-biased merge; same as `self | other`.
    pub fn merge(&self, other: &AsyncProvider) -> AsyncProvider {
        AsyncProvider {
            state: self.state.merge(&other.state),
        }
    }

    /// Resolves every pending factory and returns the open scope.
    ///
    /// On failure, every acquisition made so far is released in reverse
    /// order before the error is returned.
    pub async fn enter_async(&self) -> DiResult<AsyncResolvedScope> {
        let span = tracing::debug_span!(
            "build_async",
            pending = self.state.pending.len(),
            seeded = self.state.seed.len()
        );
        self.resolve().instrument(span).await
    }

    async fn resolve(&self) -> DiResult<AsyncResolvedScope> {
        let mut pending = self.state.pending.clone();
        let mut resolved = self.state.seed.clone();
        let mut teardown = AsyncTeardownStack::new(self.state.observers.clone());

        while !pending.is_empty() {
            let factory = match self.state.next_solvable(&pending, &resolved) {
                Some(factory) => factory,
                None => {
                    let error = self.state.unresolved(&pending);
                    teardown.run_all_reverse().await;
                    return Err(error);
                }
            };
            let key = *factory.key();
            let started = self.state.acquiring(&key);
            let outcome = AssertUnwindSafe(resolved.solve_async(&factory)).catch_unwind().await;
            let acquired = match outcome {
                Ok(Ok(acquired)) => acquired,
                Err(payload) => {
                    teardown.run_all_reverse().await;
                    panic::resume_unwind(payload);
                }
                Ok(Err(e)) => {
                    self.state.failed(&key, &e);
                    teardown.run_all_reverse().await;
                    return Err(e);
                }
            };
            self.state.acquired(&key, started);
            teardown.push(key, acquired.release);
            pending.remove(&key);
            resolved = resolved.with_instance(key, acquired.instance);
        }

        Ok(AsyncResolvedScope::new(Container::new(resolved), teardown))
    }

    /// Resolves, awaits `f` with the container, then releases everything in
    /// reverse acquisition order.
    ///
    /// Releases also run if `f` panics; the panic then resumes.
    pub async fn build_async<R, F, Fut>(&self, f: F) -> DiResult<R>
    where
        F: FnOnce(Container) -> Fut,
        Fut: Future<Output = R>,
    {
        let scope = self.enter_async().await?;
        let container = scope.container().clone();
        let outcome = AssertUnwindSafe(async move { f(container).await })
            .catch_unwind()
            .await;
        scope.close().await;
        match outcome {
            Ok(result) => Ok(result),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// Human-readable listing of pending factories and seed values.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        super::debug_listing("AsyncProvider", &self.describe())
    }
}

impl From<super::Provider> for AsyncProvider {
    fn from(provider: super::Provider) -> Self {
        provider.into_async()
    }
}

impl fmt::Debug for AsyncProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncProvider")
            .field("pending", &self.state.pending)
            .field("seed", &self.state.seed)
            .field("config", &self.state.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiError;
    use std::sync::Mutex;

    #[tokio::test]
    async fn async_release_runs_after_sync_dependents() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut provider = AsyncProvider::new();

        let l = log.clone();
        provider
            .include_async_scoped(move || {
                let l = l.clone();
                async move {
                    l.lock().unwrap().push("open u8");
                    let l = l.clone();
                    Ok(AsyncScoped::new(1u8).on_release_async(move |_| async move {
                        tokio::task::yield_now().await;
                        l.lock().unwrap().push("close u8");
                    }))
                }
            })
            .unwrap();
        let l = log.clone();
        provider
            .include_scoped(move |a: Arc<u8>| {
                l.lock().unwrap().push("open u16");
                let l = l.clone();
                Ok(Scoped::new(*a as u16).on_release(move |_| l.lock().unwrap().push("close u16")))
            })
            .unwrap();

        let value = provider
            .build_async(|c| async move { *c.require::<u16>().unwrap() })
            .await
            .unwrap();
        assert_eq!(value, 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["open u8", "open u16", "close u16", "close u8"]
        );
    }

    #[tokio::test]
    async fn failure_unwinds_async_releases() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let mut provider = AsyncProvider::from_async_scoped_factory(move || {
            let l = l.clone();
            async move {
                Ok(AsyncScoped::new(1u8).on_release_async(move |_| async move {
                    l.lock().unwrap().push("close u8");
                }))
            }
        })
        .unwrap();
        provider
            .include_async(|_: Arc<u8>| async { 2u16 })
            .unwrap()
            .include_async_scoped(|_: Arc<u16>| async {
                Err::<AsyncScoped<u32>, _>(DiError::producer(std::io::Error::other("down")))
            })
            .unwrap();

        let err = provider.enter_async().await.unwrap_err();
        assert!(matches!(err, DiError::Producer { key: Some("u32"), .. }));
        assert_eq!(*log.lock().unwrap(), vec!["close u8"]);
    }

    #[tokio::test]
    async fn unresolved_graph_releases_before_failing() {
        let mut provider = AsyncProvider::new();
        provider
            .include(|| 1u8)
            .unwrap()
            .include(|_: Arc<u32>| 1u16)
            .unwrap();
        let err = provider.enter_async().await.unwrap_err();
        assert!(matches!(err, DiError::Unresolved(names) if names == vec!["u16"]));
    }
}
