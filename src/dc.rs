//! Shared handle to a resolved service

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// `Dc` stands for Dependency Container.
///
/// This struct wraps a resolved type `T` that is **shared** through an [`Arc`].
/// It is the argument type factories use to receive their dependencies.
///
/// # Example
/// ```
/// use wirebox::{ContainerBuilder, Dc};
///
/// #[derive(Default)]
/// struct Config {
///     retries: u32
/// }
///
/// struct Client {
///     retries: u32
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder
///     .register_singleton(Config { retries: 3 })
///     .register_transient_factory(|config: Dc<Config>| Ok(Client { retries: config.retries }));
///
/// let container = builder.build();
/// let client = container.get::<Client>().unwrap();
///
/// assert_eq!(client.retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Dc<T: Send + Sync>(Arc<T>);

impl<T: Send + Sync> Deref for Dc<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Clone + Send + Sync> DerefMut for Dc<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }
}

impl<T: Send + Sync> From<Arc<T>> for Dc<T> {
    #[inline]
    fn from(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

impl<T: Send + Sync> Dc<T> {
    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: Send + Sync + Clone> Dc<T> {
    /// Clones and returns the inner `T`.
    ///
    /// Equivalent to calling [`Clone::clone`] on the inner `T`.
    #[inline]
    pub fn cloned(&self) -> T {
        self.0.as_ref().clone()
    }
}
