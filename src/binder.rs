//! Partial application of callables against a resolved container.
//!
//! Binding only looks services up; it never builds anything. Two forms:
//!
//! - typed: [`Container::call`] and [`Container::call_async`] invoke any
//!   [`Producer`] with every parameter taken from the container;
//! - dynamic: [`Container::bind`] takes a [`Signature`] stated by an external
//!   key extractor, pre-binds every parameter the container can satisfy and
//!   returns a [`Bound`] callable for the rest.

use std::future::Future;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, Producer};
use crate::key::{key_of_type, Key};
use crate::provider::Container;

/// Wraps a value as a type-erased argument for [`Bound::call`].
pub fn arg<T: Send + Sync + 'static>(value: T) -> AnyArc {
    Arc::new(value)
}

impl Container {
    /// Invokes `f` with every parameter resolved from this container.
    ///
    /// ```
    /// use ferrous_scope::Provider;
    /// use std::sync::Arc;
    ///
    /// struct DbUri(String);
    ///
    /// let provider = Provider::new().with_value(DbUri("sqlite://mem".into()));
    /// let uri = provider
    ///     .build(|c| c.call(|uri: Arc<DbUri>| uri.0.clone()))
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(uri, "sqlite://mem");
    /// ```
    pub fn call<Args, R, F>(&self, f: F) -> DiResult<R>
    where
        F: Producer<Args, R>,
    {
        let args = F::input_keys()
            .iter()
            .map(|key| self.require_key(key))
            .collect::<DiResult<Vec<AnyArc>>>()?;
        f.produce(&args)
    }

    /// Invokes an async `f` with every parameter resolved from this container.
    pub async fn call_async<Args, R, F, Fut>(&self, f: F) -> DiResult<R>
    where
        F: Producer<Args, Fut>,
        Fut: Future<Output = R>,
    {
        let pending = self.call(f)?;
        Ok(pending.await)
    }

    /// Pre-binds every parameter of `signature` whose key is resolved here.
    ///
    /// Fails with `Binding` when two parameters share a name.
    pub fn bind<R, F>(&self, signature: Signature, f: F) -> DiResult<Bound<R>>
    where
        F: Fn(Arguments) -> R + Send + Sync + 'static,
    {
        for (i, param) in signature.params.iter().enumerate() {
            if signature.params[..i].iter().any(|p| p.name == param.name) {
                return Err(DiError::Binding(format!(
                    "parameter `{}` is declared twice",
                    param.name
                )));
            }
        }
        let bound = signature
            .params
            .iter()
            .map(|p| self.get_key(&p.key))
            .collect();
        Ok(Bound {
            signature,
            bound,
            call: Arc::new(f),
        })
    }
}

/// One declared parameter of an externally described callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub key: Key,
}

/// Ordered parameter list of an externally described callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter with an explicit key.
    pub fn param(mut self, name: &'static str, key: Key) -> Self {
        self.params.push(Param { name, key });
        self
    }

    /// Appends a parameter keyed by `T`.
    pub fn typed<T: 'static>(self, name: &'static str) -> Self {
        self.param(name, key_of_type::<T>())
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<Param> for Signature {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// The complete argument list handed to a bound callable, in signature order.
#[derive(Clone)]
pub struct Arguments {
    values: Vec<(Param, AnyArc)>,
}

impl Arguments {
    /// Argument passed for the parameter named `name`.
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        let value = self
            .values
            .iter()
            .find(|(p, _)| p.name == name)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| DiError::Binding(format!("no parameter named `{}`", name)))?;
        value
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Argument at `index` in signature order.
    pub fn at<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (_, value) = self
            .values
            .get(index)
            .ok_or_else(|| DiError::Binding(format!("no parameter at position {}", index)))?;
        value
            .clone()
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A callable with the container-satisfiable parameters already bound.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{arg, DiError, Provider, Signature};
///
/// struct User(String);
///
/// let provider = Provider::new().with_value(User("ferris".into()));
/// provider.build(|c| {
///     let signature = Signature::new().typed::<User>("user").typed::<u32>("times");
///     let greet = c
///         .bind(signature, |args| {
///             let user = args.get::<User>("user")?;
///             let times = args.get::<u32>("times")?;
///             Ok::<_, DiError>(format!("hi {}", user.0).repeat(*times as usize))
///         })
///         .unwrap();
///
///     let remaining: Vec<_> = greet.remaining().params().iter().map(|p| p.name).collect();
///     assert_eq!(remaining, vec!["times"]);
///     assert_eq!(greet.call(vec![arg(2u32)]).unwrap().unwrap(), "hi ferrishi ferris");
///     assert!(matches!(greet.call(vec![]), Err(DiError::Binding(_))));
/// }).unwrap();
/// ```
pub struct Bound<R> {
    signature: Signature,
    bound: Vec<Option<AnyArc>>,
    call: Arc<dyn Fn(Arguments) -> R + Send + Sync>,
}

impl<R> Bound<R> {
    /// Parameters still to be supplied at call time, in signature order.
    pub fn remaining(&self) -> Signature {
        self.unbound().map(|(param, _)| *param).collect()
    }

    /// Whether every parameter is already bound.
    pub fn is_complete(&self) -> bool {
        self.bound.iter().all(Option::is_some)
    }

    /// Calls with the unbound parameters filled in order from `positional`.
    pub fn call(&self, positional: Vec<AnyArc>) -> DiResult<R> {
        let expected = self.unbound().count();
        if positional.len() != expected {
            let kind = if positional.len() < expected { "missing" } else { "surplus" };
            return Err(DiError::Binding(format!(
                "{} arguments: expected {}, got {}",
                kind,
                expected,
                positional.len()
            )));
        }
        let mut supplied = positional.into_iter();
        let mut values = Vec::with_capacity(self.bound.len());
        for (param, bound) in self.signature.params.iter().zip(&self.bound) {
            let value = match bound {
                Some(value) => value.clone(),
                None => match supplied.next() {
                    Some(value) => checked(param, value)?,
                    None => return Err(missing(&[param.name])),
                },
            };
            values.push((*param, value));
        }
        Ok((self.call)(Arguments { values }))
    }

    /// Calls with the unbound parameters filled by name.
    pub fn call_with<I>(&self, named: I) -> DiResult<R>
    where
        I: IntoIterator<Item = (&'static str, AnyArc)>,
    {
        let mut supplied: Vec<Option<AnyArc>> = vec![None; self.bound.len()];
        for (name, value) in named {
            let position = self
                .signature
                .params
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| DiError::Binding(format!("unexpected argument `{}`", name)))?;
            if self.bound[position].is_some() {
                return Err(DiError::Binding(format!(
                    "argument `{}` is already bound from the container",
                    name
                )));
            }
            if supplied[position].is_some() {
                return Err(DiError::Binding(format!("argument `{}` given twice", name)));
            }
            supplied[position] = Some(checked(&self.signature.params[position], value)?);
        }

        let absent: Vec<&'static str> = self
            .unbound()
            .filter(|(_, position)| supplied[*position].is_none())
            .map(|(param, _)| param.name)
            .collect();
        if !absent.is_empty() {
            return Err(missing(&absent));
        }

        let values = self
            .signature
            .params
            .iter()
            .zip(self.bound.iter().zip(supplied))
            .filter_map(|(param, (bound, supplied))| {
                bound.clone().or(supplied).map(|value| (*param, value))
            })
            .collect();
        Ok((self.call)(Arguments { values }))
    }

    fn unbound(&self) -> impl Iterator<Item = (&Param, usize)> {
        self.signature
            .params
            .iter()
            .zip(&self.bound)
            .enumerate()
            .filter(|(_, (_, bound))| bound.is_none())
            .map(|(position, (param, _))| (param, position))
    }
}

impl<R> Clone for Bound<R> {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            bound: self.bound.clone(),
            call: self.call.clone(),
        }
    }
}

fn missing(names: &[&str]) -> DiError {
    DiError::Binding(format!("missing arguments: {}", names.join(", ")))
}

fn checked(param: &Param, value: AnyArc) -> DiResult<AnyArc> {
    let actual = (*value).type_id();
    match param.key.type_id() {
        Some(expected) if expected != actual => Err(DiError::Binding(format!(
            "argument `{}` is not a {}",
            param.name,
            param.key.display_name()
        ))),
        _ => Ok(value),
    }
}
