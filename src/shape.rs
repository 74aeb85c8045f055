//! Producer shape definitions.

/// The four producer shapes normalised into one scoped-acquisition contract.
///
/// # Shape Characteristics
///
/// - **Plain**: returns the value, nothing to release
/// - **Scoped**: returns a [`Scoped`](crate::Scoped) value carrying a release action
/// - **AsyncPlain** / **AsyncScoped**: the asynchronous analogues
///
/// # Examples
///
/// ```rust
/// use ferrous_scope::{Provider, ProducerShape};
///
/// struct Settings;
///
/// let provider = Provider::from_factory(|| Settings).unwrap();
/// let graph = provider.describe();
/// assert_eq!(graph.nodes[0].shape, Some(ProducerShape::Plain));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProducerShape {
    /// Synchronous producer returning the instance directly
    Plain,
    /// Synchronous producer whose instance is released when the scope exits
    Scoped,
    /// Asynchronous producer returning the instance directly
    AsyncPlain,
    /// Asynchronous producer whose instance is released when the scope exits
    AsyncScoped,
}

impl ProducerShape {
    /// True for the asynchronous shapes.
    pub fn is_async(self) -> bool {
        matches!(self, ProducerShape::AsyncPlain | ProducerShape::AsyncScoped)
    }

    /// True for the shapes that may carry a release action.
    pub fn is_scoped(self) -> bool {
        matches!(self, ProducerShape::Scoped | ProducerShape::AsyncScoped)
    }
}
