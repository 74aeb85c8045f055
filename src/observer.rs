//! Diagnostic observers for build-pass traceability.
//!
//! Observers receive one event per acquisition, release and failure of a
//! build pass. They complement the `tracing` events the engine always emits
//! and are the hook for metrics or test assertions about ordering.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for build-pass events.
///
/// Observer calls are made synchronously on the resolving thread or task.
/// Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{DiObserver, Key, Provider};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<String>>);
///
/// impl DiObserver for Recorder {
///     fn acquiring(&self, key: &Key) {
///         self.0.lock().unwrap().push(format!("+{}", key));
///     }
///     fn acquired(&self, _key: &Key, _duration: Duration) {}
///     fn released(&self, key: &Key) {
///         self.0.lock().unwrap().push(format!("-{}", key));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut provider = Provider::from_factory(|| 7u8).unwrap();
/// provider.add_observer(recorder.clone());
/// provider.build(|_| ()).unwrap();
///
/// assert_eq!(*recorder.0.lock().unwrap(), vec!["+u8", "-u8"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a factory's acquisition starts.
    fn acquiring(&self, key: &Key);

    /// Called when a factory's acquisition completed.
    fn acquired(&self, key: &Key, duration: Duration);

    /// Called after an acquisition's release ran (or, for unscoped
    /// producers, when it would have).
    fn released(&self, key: &Key);

    /// Called when a factory's acquisition failed. The error then unwinds
    /// every earlier acquisition before reaching the caller.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }

    /// Called when a build pass stops with pending factories left.
    fn unresolved(&self, pending: &[Key]) {
        let _ = pending;
    }
}

/// Container for registered observers.
///
/// Cheap to clone; each build pass carries its own copy into the teardown
/// stack.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    /// Observers of `self` followed by those of `other`, without duplicates.
    pub(crate) fn merged(&self, other: &Observers) -> Observers {
        let mut observers = self.observers.clone();
        for candidate in &other.observers {
            if !observers.iter().any(|o| Arc::ptr_eq(o, candidate)) {
                observers.push(candidate.clone());
            }
        }
        Observers { observers }
    }

    #[inline]
    pub(crate) fn acquiring(&self, key: &Key) {
        for observer in &self.observers {
            observer.acquiring(key);
        }
    }

    #[inline]
    pub(crate) fn acquired(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.acquired(key, duration);
        }
    }

    #[inline]
    pub(crate) fn released(&self, key: &Key) {
        for observer in &self.observers {
            observer.released(key);
        }
    }

    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }

    pub(crate) fn unresolved(&self, pending: &[Key]) {
        for observer in &self.observers {
            observer.unresolved(pending);
        }
    }
}

/// Built-in observer that forwards events to `tracing` at info level.
///
/// The engine already emits debug-level events; this observer is for
/// applications that want acquisitions visible at their default filter.
///
/// # Examples
///
/// ```
/// use ferrous_scope::{LoggingObserver, Provider};
/// use std::sync::Arc;
///
/// let mut provider = Provider::new();
/// provider.add_observer(Arc::new(LoggingObserver::new()));
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// Creates a new logging observer with default prefix.
    pub fn new() -> Self {
        Self {
            prefix: "[ferrous-scope]".to_string(),
        }
    }

    /// Creates a new logging observer with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn acquiring(&self, key: &Key) {
        tracing::info!("{} Acquiring: {}", self.prefix, key);
    }

    fn acquired(&self, key: &Key, duration: Duration) {
        tracing::info!("{} Acquired: {} in {:?}", self.prefix, key, duration);
    }

    fn released(&self, key: &Key) {
        tracing::info!("{} Released: {}", self.prefix, key);
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::error!("{} FAILED acquiring {}: {}", self.prefix, key, error);
    }

    fn unresolved(&self, pending: &[Key]) {
        let names: Vec<String> = pending.iter().map(ToString::to_string).collect();
        tracing::warn!("{} Unresolved: {}", self.prefix, names.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counting {
        events: Mutex<Vec<&'static str>>,
    }

    impl DiObserver for Counting {
        fn acquiring(&self, _key: &Key) {
            self.events.lock().unwrap().push("acquiring");
        }
        fn acquired(&self, _key: &Key, _duration: Duration) {
            self.events.lock().unwrap().push("acquired");
        }
        fn released(&self, _key: &Key) {
            self.events.lock().unwrap().push("released");
        }
    }

    #[test]
    fn merged_skips_shared_observers() {
        let shared: Arc<dyn DiObserver> = Arc::new(Counting::default());
        let mut left = Observers::new();
        left.add(shared.clone());
        let mut right = Observers::new();
        right.add(shared);
        right.add(Arc::new(Counting::default()));

        let merged = left.merged(&right);
        assert_eq!(merged.observers.len(), 2);
    }

    #[test]
    fn notifies_every_observer() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let mut observers = Observers::new();
        observers.add(a.clone());
        observers.add(b.clone());

        let key = key_of_type::<u8>();
        observers.acquiring(&key);
        observers.acquired(&key, Duration::from_millis(1));
        observers.released(&key);
        observers.failed(&key, &DiError::NotFound("u8"));

        for o in [a, b] {
            assert_eq!(*o.events.lock().unwrap(), vec!["acquiring", "acquired", "released"]);
        }
    }
}
