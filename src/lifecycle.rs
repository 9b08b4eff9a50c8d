//! Lifecycle policies that decide whether a built object is reused

use crate::{cache::ObjectCache, error::Error};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

/// A lifecycle policy of a registered instance.
///
/// An instance-level lifecycle always wins over the lifecycle of its family,
/// which in turn wins over the container's default
/// (see [`ContainerConfig::with_default_lifecycle`](crate::ContainerConfig::with_default_lifecycle)).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// A new object on every resolution, never cached
    Transient,
    /// One object per top-level resolution call, shared by all of its dependents
    #[default]
    PerRequest,
    /// One object per registering container, disposed with that container
    Singleton,
    /// One object per calling container
    ContainerScoped,
    /// One object per calling container and thread
    ThreadLocal,
    /// The ambient scope (a nested container) when there is one, otherwise [`Lifecycle::ThreadLocal`]
    Hybrid,
}

/// Where a lifecycle keeps its objects
#[derive(Debug, Clone)]
pub enum LifecycleCache {
    /// Nothing is kept; every resolution builds a new object
    Unique,
    /// Kept by the current resolution session
    Request,
    /// Kept by a cache that outlives the session
    Shared(Arc<ObjectCache>),
}

/// The caches a lifecycle can choose from.
///
/// Every method defaults to `None`, in which case caching policies fall back
/// to the session cache. This is what a standalone session gets.
pub trait LifecycleContext {
    /// The singleton cache of the container owning the instance
    fn singletons(&self) -> Option<Arc<ObjectCache>> {
        None
    }

    /// The cache of the calling container
    fn container_cache(&self) -> Option<Arc<ObjectCache>> {
        None
    }

    /// The cache of the calling container for the current thread
    fn thread_local_cache(&self) -> Option<Arc<ObjectCache>> {
        None
    }

    /// The cache of the ambient scope, if resolution runs inside one
    fn ambient_cache(&self) -> Option<Arc<ObjectCache>> {
        None
    }

    /// Tracking list for transient and per-request disposables
    fn transients(&self) -> Option<Arc<ObjectCache>> {
        None
    }
}

/// A lifecycle context without any caches
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl LifecycleContext for NoContext {}

impl Lifecycle {
    /// Selects the cache this lifecycle uses in the given context
    pub fn find_cache(self, context: &dyn LifecycleContext) -> LifecycleCache {
        let shared = match self {
            Lifecycle::Transient => return LifecycleCache::Unique,
            Lifecycle::PerRequest => return LifecycleCache::Request,
            Lifecycle::Singleton => context.singletons(),
            Lifecycle::ContainerScoped => context.container_cache(),
            Lifecycle::ThreadLocal => context.thread_local_cache(),
            Lifecycle::Hybrid => context
                .ambient_cache()
                .or_else(|| context.thread_local_cache()),
        };
        shared.map_or(LifecycleCache::Request, LifecycleCache::Shared)
    }

    /// Disposes and clears everything this lifecycle cached in the given context
    pub fn eject_all(self, context: &dyn LifecycleContext) -> Result<(), Error> {
        let cache = match self.find_cache(context) {
            LifecycleCache::Shared(cache) => Some(cache),
            LifecycleCache::Unique | LifecycleCache::Request => context.transients(),
        };
        tracing::debug!(lifecycle = %self, "ejecting all cached objects");
        cache.map_or(Ok(()), |cache| cache.dispose_and_clear())
    }

    /// Returns `true` for [`Lifecycle::Singleton`]
    #[inline]
    pub fn is_singleton(self) -> bool {
        self == Lifecycle::Singleton
    }
}

impl Display for Lifecycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifecycle::Transient => "Transient",
            Lifecycle::PerRequest => "PerRequest",
            Lifecycle::Singleton => "Singleton",
            Lifecycle::ContainerScoped => "ContainerScoped",
            Lifecycle::ThreadLocal => "ThreadLocal",
            Lifecycle::Hybrid => "Hybrid",
        };
        f.write_str(name)
    }
}
