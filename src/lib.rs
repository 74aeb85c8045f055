//! # ferrous-scope
//!
//! Composable providers that resolve a dependency graph once, hand the
//! resolved services to the caller, then release everything in exact reverse
//! acquisition order.
//!
//! ## Features
//!
//! - **Key discovery from types**: a producer's inputs and output are read
//!   from its signature; nothing is restated by hand
//! - **Scoped acquisitions**: producers may attach release actions that run
//!   when the build scope exits, dependents first
//! - **Exception-safe teardown**: a failing producer or a panicking caller
//!   still releases everything acquired so far
//! - **Composition by merge**: `left | right` combines providers, with
//!   factories taking precedence over fixed values
//! - **Sync and async**: synchronous providers lift into asynchronous ones
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_scope::{Provider, Scoped};
//! use std::sync::Arc;
//!
//! struct Config {
//!     db_uri: String,
//! }
//!
//! struct Database {
//!     uri: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut provider = Provider::new().with_value(Config {
//!     db_uri: "postgres://localhost".to_string(),
//! });
//! provider
//!     .include_scoped(|config: Arc<Config>| {
//!         Ok(Scoped::new(Database { uri: config.db_uri.clone() })
//!             .on_release(|db| println!("closing {}", db.uri)))
//!     })
//!     .unwrap()
//!     .include(|db: Arc<Database>| UserService { db })
//!     .unwrap();
//!
//! let uri = provider
//!     .build(|container| container.require::<UserService>().unwrap().db.uri.clone())
//!     .unwrap();
//! assert_eq!(uri, "postgres://localhost");
//! ```
//!
//! ## Merging
//!
//! A factory for a key beats a fixed value for it, whichever side of `|`
//! either is on; otherwise the right operand wins.
//!
//! ```rust
//! use ferrous_scope::Provider;
//!
//! let defaults = Provider::new().with_value(8080u16);
//! let overrides = Provider::new().with_value(9090u16);
//! let port = (defaults | overrides).build(|c| *c.require::<u16>().unwrap()).unwrap();
//! assert_eq!(port, 9090);
//! ```
//!
//! ## Async Providers
//!
//! ```rust
//! use ferrous_scope::{AsyncProvider, Provider};
//! use std::sync::Arc;
//!
//! struct Token(String);
//!
//! # async fn run() -> ferrous_scope::DiResult<()> {
//! let mut remote = AsyncProvider::new();
//! remote.include_async(|| async { Token("t-1".into()) })?;
//!
//! let provider = Provider::new().with_value(3u8) | remote;
//! let token = provider
//!     .build_async(|c| async move { c.require::<Token>().map(|t| t.0.clone()) })
//!     .await??;
//! assert_eq!(token, "t-1");
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod binder;
pub mod collection;
pub mod config;
pub mod error;
pub mod factory;
pub mod graph_export;
pub mod key;
pub mod observer;
pub mod provider;
pub mod shape;
pub mod traits;

// Internal modules
mod internal;
mod resolved;

pub use binder::{arg, Arguments, Bound, Param, Signature};
pub use collection::{FactoryGroup, ProviderModule, ProviderModuleExt};
pub use config::{ResolveConfig, ScanOrder};
pub use error::{BoxError, DiError, DiResult};
pub use factory::{AnyArc, AsyncFactory, AsyncScoped, Factory, FactoryBuilder, Producer, Scoped, SyncFactory};
pub use graph_export::{GraphNode, NodeState, ProviderGraph};
pub use key::{key_of_type, named_key_of_type, Key};
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{AsyncProvider, AsyncResolvedScope, Container, Provider, ResolvedScope};
pub use shape::ProducerShape;
pub use traits::{AsyncDispose, Dispose, Resolver};
