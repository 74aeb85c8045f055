//! Error types for provider registration, resolution and lookup.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Shared, type-erased error raised by a producer.
pub type BoxError = Arc<dyn StdError + Send + Sync + 'static>;

/// Dependency resolution errors
///
/// Represents the conditions that can occur while registering factories,
/// building a provider, or looking services up in a resolved container.
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{DiError, Provider};
///
/// struct Missing;
///
/// let provider = Provider::new();
/// let looked_up = provider.build(|container| container.require::<Missing>());
/// match looked_up {
///     Ok(Err(DiError::NotFound(name))) => assert!(name.ends_with("Missing")),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Producer has no discoverable output key or input key
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// No pending factory is solvable (cycle or missing dependency)
    #[error("Unresolved dependencies: {}", .0.join(", "))]
    Unresolved(Vec<&'static str>),
    /// Service not present in the resolved container
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// Stored instance does not downcast to the requested type
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Wrong arguments supplied to a bound callable
    #[error("Binding error: {0}")]
    Binding(String),
    /// Error raised by a producer, kept intact as the source
    #[error("Producer failed for {}: {}", .key.unwrap_or("<unknown>"), .source)]
    Producer {
        /// Display name of the key whose factory failed, once known
        key: Option<&'static str>,
        /// The producer's own error
        #[source]
        source: BoxError,
    },
}

impl DiError {
    /// Wraps a producer's own error.
    ///
    /// The key is stamped in by the engine when the error surfaces from a
    /// factory build.
    ///
    /// ```rust
    /// use ferrous_scope::DiError;
    ///
    /// let err = DiError::producer(std::io::Error::other("disk full"));
    /// assert!(err.producer_source::<std::io::Error>().is_some());
    /// ```
    pub fn producer<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        DiError::Producer {
            key: None,
            source: Arc::new(error),
        }
    }

    /// Downcasts a producer error to its original type.
    pub fn producer_source<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            DiError::Producer { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns true for errors raised by a producer.
    pub fn is_producer(&self) -> bool {
        matches!(self, DiError::Producer { .. })
    }

    pub(crate) fn with_key(self, name: &'static str) -> Self {
        match self {
            DiError::Producer { key: None, source } => DiError::Producer {
                key: Some(name),
                source,
            },
            other => other,
        }
    }
}

/// Result type for DI operations
///
/// A convenience alias for `Result<T, DiError>` used throughout the crate.
pub type DiResult<T> = Result<T, DiError>;
