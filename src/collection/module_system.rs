//! Provider modules for grouping related registrations.
//!
//! A module bundles the registrations of one concern (storage, HTTP
//! clients, ...) so applications can assemble a provider from modules
//! instead of one long registration list.

use crate::{AsyncProvider, DiResult, Provider};

/// A group of registrations applied to a provider.
///
/// `P` is the provider kind the module registers into. Closures taking
/// `&mut P` are modules too.
///
/// # Example
///
/// ```rust
/// use ferrous_scope::{DiResult, Provider, ProviderModule, ProviderModuleExt};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct UserConfig;
///
/// struct UserService;
/// impl UserService {
///     fn new(_config: Arc<UserConfig>) -> Self { Self }
/// }
///
/// struct UserModule;
///
/// impl ProviderModule for UserModule {
///     fn register(self, provider: &mut Provider) -> DiResult<()> {
///         provider.include(|| UserConfig::default())?;
///         provider.include(UserService::new)?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = Provider::new().with_module(UserModule)?;
/// assert!(provider.build(|c| c.contains::<UserService>())?);
/// # Ok(())
/// # }
/// ```
pub trait ProviderModule<P = Provider> {
    /// Apply this module's registrations to `provider`.
    fn register(self, provider: &mut P) -> DiResult<()>;
}

impl<P, F> ProviderModule<P> for F
where
    F: FnOnce(&mut P) -> DiResult<()>,
{
    fn register(self, provider: &mut P) -> DiResult<()> {
        self(provider)
    }
}

/// Builder-style module registration.
///
/// # Example
///
/// ```rust
/// use ferrous_scope::{DiResult, Provider, ProviderModule, ProviderModuleExt};
///
/// struct DatabaseModule;
/// impl ProviderModule for DatabaseModule {
///     fn register(self, _: &mut Provider) -> DiResult<()> { Ok(()) }
/// }
///
/// # fn main() -> DiResult<()> {
/// let provider = Provider::new()
///     .with_module(DatabaseModule)?
///     .with_module(|p: &mut Provider| -> DiResult<()> {
///         p.include(|| 8080u16)?;
///         Ok(())
///     })?;
/// # let _ = provider;
/// # Ok(())
/// # }
/// ```
pub trait ProviderModuleExt: Sized {
    /// Applies `module` and returns the provider.
    fn with_module<M: ProviderModule<Self>>(self, module: M) -> DiResult<Self>;
}

impl ProviderModuleExt for Provider {
    fn with_module<M: ProviderModule<Self>>(mut self, module: M) -> DiResult<Self> {
        module.register(&mut self)?;
        Ok(self)
    }
}

impl ProviderModuleExt for AsyncProvider {
    fn with_module<M: ProviderModule<Self>>(mut self, module: M) -> DiResult<Self> {
        module.register(&mut self)?;
        Ok(self)
    }
}
