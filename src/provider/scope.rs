//! Open build scopes.
//!
//! A scope owns the resolved container of one build pass together with the
//! release actions owed for it. Closing the scope (or, for the sync form,
//! dropping it) runs those releases in reverse acquisition order.

use std::fmt;
use std::ops::Deref;

use super::Container;
use crate::internal::{AsyncTeardownStack, TeardownStack};

/// An open synchronous build pass.
///
/// Derefs to the [`Container`]. Releases run on [`close`](Self::close) or on
/// drop, including drops during a panic unwind.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{Provider, Scoped};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let closed = Arc::new(AtomicUsize::new(0));
/// let counter = closed.clone();
///
/// let mut provider = Provider::new();
/// provider.include_scoped(move || {
///     let counter = counter.clone();
///     Ok(Scoped::new(5u32).on_release(move |_| { counter.fetch_add(1, Ordering::SeqCst); }))
/// }).unwrap();
///
/// let scope = provider.enter().unwrap();
/// assert_eq!(*scope.require::<u32>().unwrap(), 5);
/// assert_eq!(closed.load(Ordering::SeqCst), 0);
/// scope.close();
/// assert_eq!(closed.load(Ordering::SeqCst), 1);
/// ```
pub struct ResolvedScope {
    container: Container,
    teardown: TeardownStack,
}

impl ResolvedScope {
    pub(crate) fn new(container: Container, teardown: TeardownStack) -> Self {
        Self { container, teardown }
    }

    /// The resolved services.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Number of acquisitions this scope still owes a release for.
    pub fn pending_releases(&self) -> usize {
        self.teardown.len()
    }

    /// Runs every release in reverse acquisition order.
    pub fn close(mut self) {
        self.teardown.run_all_reverse();
    }
}

impl Deref for ResolvedScope {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl fmt::Debug for ResolvedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedScope")
            .field("container", &self.container)
            .field("pending_releases", &self.teardown.len())
            .finish()
    }
}

/// An open asynchronous build pass.
///
/// Must be finished with [`close`](Self::close). Dropping it unclosed runs
/// no release at all and logs a warning naming the ones skipped.
pub struct AsyncResolvedScope {
    container: Container,
    teardown: AsyncTeardownStack,
}

impl AsyncResolvedScope {
    pub(crate) fn new(container: Container, teardown: AsyncTeardownStack) -> Self {
        Self { container, teardown }
    }

    /// The resolved services.
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn pending_releases(&self) -> usize {
        self.teardown.len()
    }

    /// Runs every release in reverse acquisition order, awaiting async ones.
    pub async fn close(mut self) {
        self.teardown.run_all_reverse().await;
    }
}

impl Deref for AsyncResolvedScope {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl fmt::Debug for AsyncResolvedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResolvedScope")
            .field("container", &self.container)
            .field("pending_releases", &self.teardown.len())
            .finish()
    }
}
