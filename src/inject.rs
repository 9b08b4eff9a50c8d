//! Utilities to inject and resolve dependencies

use crate::{error::Error, session::Session};

/// A trait that adds the ability to inject dependencies when a type is built by the container
///
/// If there is no need to inject other dependencies, the `struct` must implement the `Default` trait
///
/// # Example
/// ```
/// use wirebox::ContainerBuilder;
///
/// #[derive(Default)]
/// struct ScopedService;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_scoped::<ScopedService>();
///
/// let container = builder.build();
/// let service = container.get::<ScopedService>().unwrap();
/// ```
///
/// If it's required to construct a `struct` from other dependencies, the `Inject` can be implemented manually
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use wirebox::{ContainerBuilder, Inject, Session, error::Error};
///
/// #[derive(Default)]
/// struct ScopedService;
///
/// struct TransientService {
///     service: Arc<ScopedService>
/// }
///
/// impl Inject for TransientService {
///     fn inject(session: &mut Session<'_>) -> Result<Self, Error> {
///         let service = session.get::<ScopedService>()?;
///         Ok(Self { service })
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_scoped::<ScopedService>()
///     .register_transient::<TransientService>();
///
/// let container = builder.build();
/// let transient = container.get::<TransientService>().unwrap();
/// let scoped = container.get::<ScopedService>().unwrap();
///
/// assert!(Arc::ptr_eq(&transient.service, &scoped));
/// ```
pub trait Inject: Sized + Send + Sync {
    /// Builds `Self`, resolving its dependencies through the session
    fn inject(session: &mut Session<'_>) -> Result<Self, Error>;
}

impl<T: Default + Send + Sync> Inject for T {
    #[inline]
    fn inject(_: &mut Session<'_>) -> Result<Self, Error> {
        Ok(Self::default())
    }
}
