//! Core traits for resolved containers and disposable services.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::Resolver;
