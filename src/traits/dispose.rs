//! Disposal traits for values that know how to release themselves.

/// Trait for synchronous resource disposal.
///
/// Implement this for services whose teardown is intrinsic to the value
/// (flushing a buffer, closing a handle) and register them with
/// [`Scoped::disposing`](crate::Scoped::disposing). Disposal runs when the
/// enclosing build scope exits, in reverse acquisition order.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Dispose, Provider, Scoped};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Cache { flushed: AtomicBool }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let mut provider = Provider::new();
/// provider.include_scoped(|| Ok(Scoped::disposing(Cache { flushed: AtomicBool::new(false) })))
///     .unwrap();
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// The async counterpart of [`Dispose`], registered with
/// [`AsyncScoped::disposing`](crate::AsyncScoped::disposing).
///
/// # Examples
///
/// ```
/// use ferrous_scope::{AsyncDispose, AsyncProvider, AsyncScoped};
/// use async_trait::async_trait;
///
/// struct DatabaseClient {
///     connection_id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for DatabaseClient {
///     async fn dispose(&self) {
///         println!("Closing database connection: {}", self.connection_id);
///     }
/// }
///
/// let mut provider = AsyncProvider::new();
/// provider.include_async_scoped(|| async {
///     Ok(AsyncScoped::disposing(DatabaseClient { connection_id: "conn_123".into() }))
/// }).unwrap();
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
