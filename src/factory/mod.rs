//! Factories: a producer normalised to one scoped-acquisition contract,
//! together with its output key and ordered input keys.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{DiError, DiResult};
use crate::internal::{Release, SyncRelease};
use crate::key::{key_of_type, Key};
use crate::shape::ProducerShape;

pub mod producer;
pub mod scoped;

pub use producer::Producer;
pub use scoped::{AsyncScoped, Scoped};

use producer::check_keys;

/// Type-erased shared instance as stored in a resolved set.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Result of a synchronous factory build.
pub(crate) struct Acquired {
    pub(crate) instance: AnyArc,
    pub(crate) release: Option<SyncRelease>,
}

/// Result of an asynchronous factory build.
pub(crate) struct AsyncAcquired {
    pub(crate) instance: AnyArc,
    pub(crate) release: Option<Release>,
}

type SyncBuildFn = dyn Fn(&[AnyArc]) -> DiResult<Acquired> + Send + Sync;
type AsyncBuildFn = dyn Fn(&[AnyArc]) -> BoxFuture<'static, DiResult<AsyncAcquired>> + Send + Sync;

/// What the resolution engine needs to know about a factory.
pub trait Factory: Clone + Send + Sync + 'static {
    /// Key of the produced service.
    fn key(&self) -> &Key;

    /// Keys of the required services, in the order the build receives them.
    fn inputs(&self) -> &[Key];

    /// Shape of the producer this factory was normalised from.
    fn shape(&self) -> ProducerShape;
}

/// A factory with a synchronous scoped build.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Factory, SyncFactory, key_of_type};
/// use std::sync::Arc;
///
/// struct Settings { uri: String }
/// struct Database { uri: String }
///
/// let factory = SyncFactory::from_fn(|s: Arc<Settings>| Database { uri: s.uri.clone() }).unwrap();
/// assert_eq!(factory.key(), &key_of_type::<Database>());
/// assert_eq!(factory.inputs(), &[key_of_type::<Settings>()]);
/// ```
#[derive(Clone)]
pub struct SyncFactory {
    key: Key,
    inputs: Arc<[Key]>,
    shape: ProducerShape,
    build: Arc<SyncBuildFn>,
}

impl SyncFactory {
    /// Normalises a plain producer: the returned value is the instance and
    /// there is nothing to release.
    pub fn from_fn<Args, T, F>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, T> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let key = key_of_type::<T>();
        let inputs = F::input_keys();
        check_keys(std::any::type_name::<F>(), &key, &inputs)?;
        Ok(Self {
            key,
            inputs: inputs.into(),
            shape: ProducerShape::Plain,
            build: Arc::new(move |args: &[AnyArc]| {
                let value = producer.produce(args)?;
                Ok(Acquired {
                    instance: Arc::new(value) as AnyArc,
                    release: None,
                })
            }),
        })
    }

    /// Normalises a scoped producer: the producer body is the acquisition
    /// and the releases attached to the returned [`Scoped`] are the teardown.
    pub fn from_scoped<Args, T, F>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, DiResult<Scoped<T>>> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let key = key_of_type::<T>();
        let inputs = F::input_keys();
        check_keys(std::any::type_name::<F>(), &key, &inputs)?;
        Ok(Self {
            key,
            inputs: inputs.into(),
            shape: ProducerShape::Scoped,
            build: Arc::new(move |args: &[AnyArc]| {
                let (value, release) = producer.produce(args)??.into_parts();
                Ok(Acquired {
                    instance: value as AnyArc,
                    release,
                })
            }),
        })
    }

    /// Registers the produced value under `name` instead of its bare type.
    pub fn named(self, name: &'static str) -> Self {
        let key = named(self.key, name);
        self.with_key(key)
    }

    /// Replaces the output key.
    ///
    /// Lookups downcast to the produced type, so the new key should still
    /// describe it.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    /// Wraps the synchronous build in an asynchronous one.
    ///
    /// The lift is one-directional: there is no way back from an
    /// [`AsyncFactory`].
    pub fn into_async(self) -> AsyncFactory {
        let build = self.build;
        AsyncFactory {
            key: self.key,
            inputs: self.inputs,
            shape: self.shape,
            build: Arc::new(move |args: &[AnyArc]| -> BoxFuture<'static, DiResult<AsyncAcquired>> {
                let acquired = build(args).map(|a| AsyncAcquired {
                    instance: a.instance,
                    release: a.release.map(Release::Sync),
                });
                Box::pin(futures::future::ready(acquired))
            }),
        }
    }

    pub(crate) fn run(&self, args: &[AnyArc]) -> DiResult<Acquired> {
        (self.build)(args)
    }
}

impl Factory for SyncFactory {
    fn key(&self) -> &Key {
        &self.key
    }

    fn inputs(&self) -> &[Key] {
        &self.inputs
    }

    fn shape(&self) -> ProducerShape {
        self.shape
    }
}

impl fmt::Debug for SyncFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncFactory")
            .field("key", &self.key)
            .field("inputs", &self.inputs)
            .field("shape", &self.shape)
            .finish()
    }
}

/// A factory with an asynchronous scoped build.
#[derive(Clone)]
pub struct AsyncFactory {
    key: Key,
    inputs: Arc<[Key]>,
    shape: ProducerShape,
    build: Arc<AsyncBuildFn>,
}

impl AsyncFactory {
    /// Normalises an async producer returning the instance directly.
    pub fn from_async_fn<Args, T, F, Fut>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let key = key_of_type::<T>();
        let inputs = F::input_keys();
        check_keys(std::any::type_name::<F>(), &key, &inputs)?;
        Ok(Self {
            key,
            inputs: inputs.into(),
            shape: ProducerShape::AsyncPlain,
            build: Arc::new(move |args: &[AnyArc]| -> BoxFuture<'static, DiResult<AsyncAcquired>> {
                let pending = producer.produce(args);
                Box::pin(async move {
                    let value = pending?.await;
                    Ok(AsyncAcquired {
                        instance: Arc::new(value) as AnyArc,
                        release: None,
                    })
                })
            }),
        })
    }

    /// Normalises an async scoped producer: the future is the acquisition
    /// and the releases attached to the returned [`AsyncScoped`] are the
    /// teardown.
    pub fn from_async_scoped<Args, T, F, Fut>(producer: F) -> DiResult<Self>
    where
        F: Producer<Args, Fut> + Send + Sync + 'static,
        Fut: Future<Output = DiResult<AsyncScoped<T>>> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let key = key_of_type::<T>();
        let inputs = F::input_keys();
        check_keys(std::any::type_name::<F>(), &key, &inputs)?;
        Ok(Self {
            key,
            inputs: inputs.into(),
            shape: ProducerShape::AsyncScoped,
            build: Arc::new(move |args: &[AnyArc]| -> BoxFuture<'static, DiResult<AsyncAcquired>> {
                let pending = producer.produce(args);
                Box::pin(async move {
                    let (value, release) = pending?.await?.into_parts();
                    Ok(AsyncAcquired {
                        instance: value as AnyArc,
                        release,
                    })
                })
            }),
        })
    }

    /// Registers the produced value under `name` instead of its bare type.
    pub fn named(self, name: &'static str) -> Self {
        let key = named(self.key, name);
        self.with_key(key)
    }

    /// Replaces the output key.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    pub(crate) fn run(&self, args: &[AnyArc]) -> BoxFuture<'static, DiResult<AsyncAcquired>> {
        (self.build)(args)
    }
}

impl Factory for AsyncFactory {
    fn key(&self) -> &Key {
        &self.key
    }

    fn inputs(&self) -> &[Key] {
        &self.inputs
    }

    fn shape(&self) -> ProducerShape {
        self.shape
    }
}

impl fmt::Debug for AsyncFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFactory")
            .field("key", &self.key)
            .field("inputs", &self.inputs)
            .field("shape", &self.shape)
            .finish()
    }
}

impl From<SyncFactory> for AsyncFactory {
    fn from(factory: SyncFactory) -> Self {
        factory.into_async()
    }
}

fn named(key: Key, name: &'static str) -> Key {
    match key {
        Key::Type(id, ty) | Key::TypeNamed(id, ty, _) => Key::TypeNamed(id, ty, name),
        Key::Token(_) => Key::Token(name),
    }
}

/// Assembles a factory from keys computed outside the type system.
///
/// This is the boundary for external key extractors: the output key and
/// every input key must be stated explicitly, and the build receives the
/// type-erased inputs in the declared order.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{AnyArc, DiError, FactoryBuilder, Key, Provider, Resolver, Scoped};
/// use std::sync::Arc;
///
/// let greeting = FactoryBuilder::new()
///     .output(Key::Token("greeting"))
///     .input(Key::Token("name"))
///     .build_sync(|inputs: &[AnyArc]| {
///         let name = inputs[0].clone().downcast::<String>().map_err(|_| DiError::TypeMismatch("String"))?;
///         Ok(Scoped::from_arc(Arc::new(format!("hello {}", name)) as AnyArc))
///     })
///     .unwrap();
///
/// let provider = Provider::new()
///     .with_keyed_value(Key::Token("name"), "ferris".to_string())
///     .with_factory(greeting);
/// let text = provider
///     .build(|c| c.require_as::<String>(&Key::Token("greeting")).unwrap())
///     .unwrap();
/// assert_eq!(*text, "hello ferris");
///
/// let missing = FactoryBuilder::new().input(Key::Token("name")).build_sync(|_| unreachable!());
/// assert!(matches!(missing, Err(DiError::Configuration(_))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FactoryBuilder {
    output: Option<Key>,
    inputs: Vec<Option<Key>>,
}

impl FactoryBuilder {
    /// Creates a builder with no output key and no inputs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output key.
    pub fn output(mut self, key: Key) -> Self {
        self.output = Some(key);
        self
    }

    /// Appends an input key.
    pub fn input(mut self, key: Key) -> Self {
        self.inputs.push(Some(key));
        self
    }

    /// Appends an input slot, keyed when the extractor found a key.
    pub fn input_slot(mut self, key: Option<Key>) -> Self {
        self.inputs.push(key);
        self
    }

    fn validate(self) -> DiResult<(Key, Arc<[Key]>)> {
        let key = self.output.ok_or_else(|| {
            DiError::Configuration("factory has no output key".to_string())
        })?;
        let inputs = self
            .inputs
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or_else(|| {
                    DiError::Configuration(format!(
                        "factory for {} parameter {} has no input key",
                        key, position
                    ))
                })
            })
            .collect::<DiResult<Vec<Key>>>()?;
        check_keys(key.display_name(), &key, &inputs)?;
        Ok((key, inputs.into()))
    }

    /// Builds a synchronous factory from a type-erased scoped build.
    pub fn build_sync<F>(self, build: F) -> DiResult<SyncFactory>
    where
        F: Fn(&[AnyArc]) -> DiResult<Scoped<dyn Any + Send + Sync>> + Send + Sync + 'static,
    {
        let (key, inputs) = self.validate()?;
        Ok(SyncFactory {
            key,
            inputs,
            shape: ProducerShape::Scoped,
            build: Arc::new(move |args: &[AnyArc]| {
                let (instance, release) = build(args)?.into_parts();
                Ok(Acquired { instance, release })
            }),
        })
    }

    /// Builds an asynchronous factory from a type-erased scoped build.
    pub fn build_async<F, Fut>(self, build: F) -> DiResult<AsyncFactory>
    where
        F: Fn(&[AnyArc]) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<AsyncScoped<dyn Any + Send + Sync>>> + Send + 'static,
    {
        let (key, inputs) = self.validate()?;
        Ok(AsyncFactory {
            key,
            inputs,
            shape: ProducerShape::AsyncScoped,
            build: Arc::new(move |args: &[AnyArc]| -> BoxFuture<'static, DiResult<AsyncAcquired>> {
                let pending = build(args);
                Box::pin(async move {
                    let (instance, release) = pending.await?.into_parts();
                    Ok(AsyncAcquired { instance, release })
                })
            }),
        })
    }
}
