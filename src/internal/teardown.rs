//! LIFO teardown stacks holding the release actions of a build pass.

use futures::future::BoxFuture;

use crate::key::Key;
use crate::observer::Observers;

/// Future type for asynchronous release actions.
pub(crate) type BoxFutureUnit = BoxFuture<'static, ()>;

/// Synchronous release action.
pub(crate) type SyncRelease = Box<dyn FnOnce() + Send>;

/// Asynchronous release action.
pub(crate) type AsyncRelease = Box<dyn FnOnce() -> BoxFutureUnit + Send>;

/// A release action recorded by an asynchronous build pass.
pub(crate) enum Release {
    Sync(SyncRelease),
    Async(AsyncRelease),
}

/// Release actions of a synchronous build pass, run in reverse order.
///
/// Every acquisition is recorded, even those with nothing to release, so
/// observers see one `released` event per acquired key. Dropping the stack
/// runs whatever is still recorded, which is what makes a panicking producer
/// or caller still release everything acquired before it.
pub(crate) struct TeardownStack {
    entries: Vec<(Key, Option<SyncRelease>)>,
    observers: Observers,
}

impl TeardownStack {
    pub(crate) fn new(observers: Observers) -> Self {
        Self {
            entries: Vec::new(),
            observers,
        }
    }

    /// Records an acquisition and its release action.
    pub(crate) fn push(&mut self, key: Key, release: Option<SyncRelease>) {
        self.entries.push((key, release));
    }

    /// Execute all release actions in reverse order (LIFO).
    pub(crate) fn run_all_reverse(&mut self) {
        while let Some((key, release)) = self.entries.pop() {
            if let Some(release) = release {
                release();
            }
            tracing::debug!(key = %key, "released");
            self.observers.released(&key);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for TeardownStack {
    fn drop(&mut self) {
        self.run_all_reverse();
    }
}

/// Release actions of an asynchronous build pass.
///
/// Async code cannot run from `Drop`, so this stack must be drained with
/// [`run_all_reverse`](Self::run_all_reverse). A stack dropped while still
/// holding entries logs a warning and runs none of them, keeping the
/// remaining releases from running out of order.
pub(crate) struct AsyncTeardownStack {
    entries: Vec<(Key, Option<Release>)>,
    observers: Observers,
}

impl AsyncTeardownStack {
    pub(crate) fn new(observers: Observers) -> Self {
        Self {
            entries: Vec::new(),
            observers,
        }
    }

    pub(crate) fn push(&mut self, key: Key, release: Option<Release>) {
        self.entries.push((key, release));
    }

    /// Execute all release actions in reverse order (LIFO), awaiting async ones.
    pub(crate) async fn run_all_reverse(&mut self) {
        while let Some((key, release)) = self.entries.pop() {
            match release {
                Some(Release::Sync(f)) => f(),
                Some(Release::Async(f)) => f().await,
                None => {}
            }
            tracing::debug!(key = %key, "released");
            self.observers.released(&key);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Drop for AsyncTeardownStack {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            let pending: Vec<String> = self.entries.iter().rev().map(|(k, _)| k.to_string()).collect();
            tracing::warn!(
                releases = ?pending,
                "async scope dropped without close(); releases were not run"
            );
        }
    }
}
