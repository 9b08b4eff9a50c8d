//! An in-process inversion-of-control container.
//!
//! Services are registered into a [`PluginGraph`] of families keyed by
//! [`PluginType`], each family holding named [`Instance`] recipes. A
//! [`Container`] resolves them within a [`Session`], caching objects according
//! to their [`Lifecycle`], and disposes what it owns when it is disposed.
//!
//! # Example
//! ```
//! use wirebox::{ContainerBuilder, Dc, ExplicitArguments};
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let mut builder = ContainerBuilder::new();
//! builder
//!     .register_singleton_default::<Clock>()
//!     .register_transient_factory(|_: Dc<Clock>, greeting: Dc<String>| Ok(Greeter {
//!         greeting: greeting.cloned()
//!     }));
//!
//! let container = builder.build();
//!
//! let greeter = container
//!     .with(ExplicitArguments::new().set(String::from("hello")))
//!     .get::<Greeter>()
//!     .unwrap();
//!
//! assert_eq!(greeter.greeting, "hello");
//! assert!(container.get::<Greeter>().is_err());
//! ```

pub use crate::{
    args::ExplicitArguments,
    config::ContainerConfig,
    container::{Container, ContainerBuilder, ContainerKind, Resolution},
    dc::Dc,
    dispose::Dispose,
    graph::PluginGraph,
    inject::Inject,
    instance::{GenericFactory, Instance, InstanceId, Object},
    lifecycle::Lifecycle,
    pipeline::{Pipeline, Registration},
    plugin_type::PluginType,
    session::{FromSession, Session},
};

pub mod args;
pub mod cache;
pub mod config;
pub mod container;
pub mod dispose;
pub mod error;
pub mod graph;
pub mod inject;
pub mod instance;
pub mod lifecycle;
pub mod pipeline;
pub mod plugin_type;
pub mod session;
mod dc;
