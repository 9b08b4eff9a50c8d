//! Explicit disposal of objects owned by a container scope

use crate::{cache::CacheKey, error::BoxError};
use std::{
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

/// A trait for objects that hold resources which must be released
/// when the scope that created them ends.
///
/// A container calls [`Dispose::dispose`] exactly once for every disposable
/// object it cached or tracked, when that container is disposed.
///
/// # Example
/// ```
/// use wirebox::{Dispose, error::BoxError};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Connection {
///     closed: AtomicBool
/// }
///
/// impl Dispose for Connection {
///     fn dispose(&self) -> Result<(), BoxError> {
///         self.closed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
/// ```
pub trait Dispose: Send + Sync {
    /// Releases the resources held by `self`
    fn dispose(&self) -> Result<(), BoxError>;
}

impl<T: Dispose + ?Sized> Dispose for Arc<T> {
    #[inline]
    fn dispose(&self) -> Result<(), BoxError> {
        (**self).dispose()
    }
}

impl<T: Dispose + ?Sized> Dispose for Box<T> {
    #[inline]
    fn dispose(&self) -> Result<(), BoxError> {
        (**self).dispose()
    }
}

/// A single object that failed to dispose
#[derive(Debug)]
pub struct DisposeFailure {
    /// What was being disposed
    pub description: String,
    /// The error returned by [`Dispose::dispose`]
    pub source: BoxError,
}

impl Display for DisposeFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.description, self.source)
    }
}

/// A disposable object remembered by the scope that owns it
pub struct Tracked {
    key: Option<CacheKey>,
    description: String,
    disposable: Arc<dyn Dispose>,
}

impl Debug for Tracked {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracked")
            .field("description", &self.description)
            .finish()
    }
}

impl Tracked {
    pub(crate) fn new(key: Option<CacheKey>, description: String, disposable: Arc<dyn Dispose>) -> Self {
        Self { key, description, disposable }
    }

    /// The cache entry the object was built for, if it was cached
    #[inline]
    pub fn key(&self) -> Option<&CacheKey> {
        self.key.as_ref()
    }

    /// What is being tracked
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Disposes every object, even if some of them fail, and returns the failures
pub(crate) fn dispose_all(tracked: Vec<Tracked>) -> Vec<DisposeFailure> {
    tracked
        .into_iter()
        .filter_map(|t| match t.disposable.dispose() {
            Ok(()) => {
                tracing::trace!(object = %t.description, "disposed");
                None
            }
            Err(source) => {
                tracing::warn!(object = %t.description, error = %source, "failed to dispose");
                Some(DisposeFailure { description: t.description, source })
            }
        })
        .collect()
}
