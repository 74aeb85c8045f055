//! Scoped values: an instance plus the release actions owed once the
//! enclosing build scope exits.

use std::future::Future;
use std::sync::Arc;

use crate::internal::{Release, SyncRelease};
use crate::traits::{AsyncDispose, Dispose};

/// A value produced by a synchronous scoped producer.
///
/// The producer body is the acquisition; the closures attached with
/// [`on_release`](Self::on_release) are the teardown. Releases run after the
/// caller is done with the resolved container and after every acquisition
/// that depended on this one has been released.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, Resolver, Scoped};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Connection { open: AtomicBool }
///
/// let mut provider = Provider::new();
/// provider.include_scoped(|| {
///     let conn = Connection { open: AtomicBool::new(true) };
///     Ok(Scoped::new(conn).on_release(|c| c.open.store(false, Ordering::SeqCst)))
/// }).unwrap();
///
/// let conn = provider.build(|c| c.require::<Connection>().unwrap()).unwrap();
/// assert!(!conn.open.load(Ordering::SeqCst));
/// ```
pub struct Scoped<T: ?Sized> {
    value: Arc<T>,
    releases: Vec<SyncRelease>,
}

impl<T: Send + Sync + 'static> Scoped<T> {
    /// Wraps a freshly acquired value with nothing to release yet.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: Dispose> Scoped<T> {
    /// Wraps a value whose [`Dispose`] impl is its release.
    pub fn disposing(value: T) -> Self {
        Self::new(value).on_release(|v| v.dispose())
    }
}

impl<T: ?Sized + Send + Sync + 'static> Scoped<T> {
    /// Wraps an already shared value.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            value,
            releases: Vec::new(),
        }
    }

    /// Attaches a release action. Several actions run in reverse order of
    /// attachment.
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let value = self.value.clone();
        self.releases.push(Box::new(move || release(&value)));
        self
    }

    /// The acquired value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// True when at least one release action is attached.
    pub fn has_release(&self) -> bool {
        !self.releases.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Arc<T>, Option<SyncRelease>) {
        (self.value, combine_sync(self.releases))
    }
}

/// A value produced by an asynchronous scoped producer.
///
/// Like [`Scoped`], with release actions that may be asynchronous.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{AsyncProvider, AsyncScoped, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Session { open: AtomicBool }
///
/// # async fn example() -> ferrous_scope::DiResult<()> {
/// let mut provider = AsyncProvider::new();
/// provider.include_async_scoped(|| async {
///     let session = Session { open: AtomicBool::new(true) };
///     Ok(AsyncScoped::new(session).on_release_async(|s: Arc<Session>| async move {
///         s.open.store(false, Ordering::SeqCst);
///     }))
/// })?;
///
/// let session = provider.build_async(|c| async move { c.require::<Session>() }).await??;
/// assert!(!session.open.load(Ordering::SeqCst));
/// # Ok(())
/// # }
/// ```
pub struct AsyncScoped<T: ?Sized> {
    value: Arc<T>,
    releases: Vec<Release>,
}

impl<T: Send + Sync + 'static> AsyncScoped<T> {
    /// Wraps a freshly acquired value with nothing to release yet.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: AsyncDispose> AsyncScoped<T> {
    /// Wraps a value whose [`AsyncDispose`] impl is its release.
    pub fn disposing(value: T) -> Self {
        Self::new(value).on_release_async(|v: Arc<T>| async move { v.dispose().await })
    }
}

impl<T: ?Sized + Send + Sync + 'static> AsyncScoped<T> {
    /// Wraps an already shared value.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            value,
            releases: Vec::new(),
        }
    }

    /// Attaches a synchronous release action.
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        let value = self.value.clone();
        self.releases
            .push(Release::Sync(Box::new(move || release(&value))));
        self
    }

    /// Attaches an asynchronous release action.
    pub fn on_release_async<F, Fut>(mut self, release: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let value = self.value.clone();
        self.releases
            .push(Release::Async(Box::new(move || Box::pin(release(value)))));
        self
    }

    /// The acquired value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// True when at least one release action is attached.
    pub fn has_release(&self) -> bool {
        !self.releases.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Arc<T>, Option<Release>) {
        (self.value, combine_async(self.releases))
    }
}

impl<T: ?Sized + Send + Sync + 'static> From<Scoped<T>> for AsyncScoped<T> {
    fn from(scoped: Scoped<T>) -> Self {
        Self {
            value: scoped.value,
            releases: scoped.releases.into_iter().map(Release::Sync).collect(),
        }
    }
}

fn combine_sync(mut releases: Vec<SyncRelease>) -> Option<SyncRelease> {
    match releases.len() {
        0 => None,
        1 => releases.pop(),
        _ => Some(Box::new(move || {
            while let Some(release) = releases.pop() {
                release();
            }
        })),
    }
}

fn combine_async(mut releases: Vec<Release>) -> Option<Release> {
    if releases.iter().all(|r| matches!(r, Release::Sync(_))) {
        let sync = releases
            .into_iter()
            .filter_map(|r| match r {
                Release::Sync(f) => Some(f),
                Release::Async(_) => None,
            })
            .collect();
        return combine_sync(sync).map(Release::Sync);
    }
    if releases.len() == 1 {
        return releases.pop();
    }
    Some(Release::Async(Box::new(move || {
        Box::pin(async move {
            while let Some(release) = releases.pop() {
                match release {
                    Release::Sync(f) => f(),
                    Release::Async(f) => f().await,
                }
            }
        })
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn releases_run_in_reverse_attachment_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        let scoped = Scoped::new(5u8)
            .on_release(move |_| o1.lock().unwrap().push("first"))
            .on_release(move |_| o2.lock().unwrap().push("second"));
        assert!(scoped.has_release());
        assert_eq!(*scoped.value(), 5);

        let (_, release) = scoped.into_parts();
        release.unwrap()();
        assert_eq!(*order.lock().unwrap(), vec!["second", "first"]);
    }

    #[test]
    fn plain_scoped_has_no_release() {
        let (value, release) = Scoped::new("v").into_parts();
        assert_eq!(*value, "v");
        assert!(release.is_none());
    }

    #[test]
    fn async_scoped_with_only_sync_releases_stays_sync() {
        let (_, release) = AsyncScoped::new(1u8).on_release(|_| {}).into_parts();
        assert!(matches!(release, Some(Release::Sync(_))));
    }

    #[tokio::test]
    async fn async_scoped_mixes_release_kinds_in_reverse() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (o1, o2) = (order.clone(), order.clone());
        let scoped = AsyncScoped::new(1u8)
            .on_release(move |_| o1.lock().unwrap().push("sync"))
            .on_release_async(move |_| async move { o2.lock().unwrap().push("async") });

        match scoped.into_parts().1 {
            Some(Release::Async(f)) => f().await,
            _ => panic!("expected an async release"),
        }
        assert_eq!(*order.lock().unwrap(), vec!["async", "sync"]);
    }
}
