//! Compile-time extraction of a producer's input keys.
//!
//! A producer is any `Fn(Arc<A1>, .., Arc<An>) -> R`. Its input keys are the
//! keys of `A1..An` in parameter order and its output key is derived from
//! the produced type, so callers never restate them by hand.

use std::any::TypeId;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;
use crate::key::{key_of_type, Key};

/// A callable whose parameters are resolved services.
///
/// Implemented for closures and functions taking up to eight `Arc<T>`
/// parameters. `Args` is the tuple of parameter types and only exists to
/// keep the per-arity implementations apart.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Producer, key_of_type};
/// use std::sync::Arc;
///
/// struct Settings;
/// struct Engine;
///
/// fn engine(_settings: Arc<Settings>) -> Engine {
///     Engine
/// }
///
/// fn keys_of<Args, R, F: Producer<Args, R>>(_f: &F) -> Vec<ferrous_scope::Key> {
///     F::input_keys()
/// }
///
/// assert_eq!(keys_of(&engine), vec![key_of_type::<Settings>()]);
/// ```
pub trait Producer<Args, R> {
    /// Keys of the parameters, in parameter order.
    fn input_keys() -> Vec<Key>;

    /// Invokes the callable with one instance per parameter, in order.
    fn produce(&self, inputs: &[AnyArc]) -> DiResult<R>;
}

fn downcast_input<T: Send + Sync + 'static>(slot: Option<&AnyArc>) -> DiResult<Arc<T>> {
    let any = slot
        .cloned()
        .ok_or(DiError::NotFound(std::any::type_name::<T>()))?;
    any.downcast::<T>()
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
}

macro_rules! impl_producer {
    ($($ty:ident),*) => {
        impl<F, R, $($ty,)*> Producer<($($ty,)*), R> for F
        where
            F: Fn($(Arc<$ty>),*) -> R,
            $($ty: Send + Sync + 'static,)*
        {
            fn input_keys() -> Vec<Key> {
                vec![$(key_of_type::<$ty>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn produce(&self, inputs: &[AnyArc]) -> DiResult<R> {
                let mut slots = inputs.iter();
                $(let $ty = downcast_input::<$ty>(slots.next())?;)*
                Ok((self)($($ty),*))
            }
        }
    };
}

impl_producer!();
impl_producer!(A1);
impl_producer!(A1, A2);
impl_producer!(A1, A2, A3);
impl_producer!(A1, A2, A3, A4);
impl_producer!(A1, A2, A3, A4, A5);
impl_producer!(A1, A2, A3, A4, A5, A6);
impl_producer!(A1, A2, A3, A4, A5, A6, A7);
impl_producer!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Rejects keys that cannot identify a service.
///
/// The unit type carries no information, so a producer returning `()` or
/// taking `Arc<()>` has no discoverable key.
pub(crate) fn check_keys(producer: &'static str, output: &Key, inputs: &[Key]) -> DiResult<()> {
    let unit = TypeId::of::<()>();
    if output.type_id() == Some(unit) {
        return Err(DiError::Configuration(format!(
            "{} does not produce a service (output type is `()`)",
            producer
        )));
    }
    if let Some(position) = inputs.iter().position(|k| k.type_id() == Some(unit)) {
        return Err(DiError::Configuration(format!(
            "{} parameter {} has no service type (`Arc<()>`)",
            producer, position
        )));
    }
    Ok(())
}
