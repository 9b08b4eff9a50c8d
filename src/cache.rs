//! Lifecycle-scoped object caches

use crate::{
    dispose::{Dispose, Tracked, dispose_all},
    error::Error,
    instance::{InstanceId, Object},
    plugin_type::PluginType,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Identifies a cached object: the plugin type it was resolved for and the instance that built it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    plugin_type: PluginType,
    instance: InstanceId,
}

impl CacheKey {
    /// Creates a new cache key
    #[inline]
    pub fn new(plugin_type: PluginType, instance: InstanceId) -> Self {
        Self { plugin_type, instance }
    }

    /// The plugin type part of the key
    #[inline]
    pub fn plugin_type(&self) -> &PluginType {
        &self.plugin_type
    }

    /// The instance part of the key
    #[inline]
    pub fn instance(&self) -> InstanceId {
        self.instance
    }
}

/// An object together with its disposal handle, if it has one
pub(crate) type Built = (Object, Option<Arc<dyn Dispose>>);

type Slot = Arc<Mutex<Option<Object>>>;

/// Objects cached for one lifecycle scope plus the disposables created through it.
///
/// Each key has its own lock, so concurrent first resolutions of the same key
/// build exactly once and every caller observes the same object.
#[derive(Default)]
pub struct ObjectCache {
    slots: DashMap<CacheKey, Slot>,
    tracked: Mutex<Vec<Tracked>>,
    closed: AtomicBool,
}

impl Debug for ObjectCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCache")
            .field("len", &self.len())
            .field("tracked", &self.tracked_count())
            .finish()
    }
}

impl ObjectCache {
    /// Creates an empty cache
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn slot(&self, key: &CacheKey) -> Option<Slot> {
        self.slots.get(key).map(|slot| Arc::clone(slot.value()))
    }

    /// Returns the cached object for `key`
    pub fn get(&self, key: &CacheKey) -> Option<Object> {
        self.slot(key).and_then(|slot| slot.lock().clone())
    }

    /// Returns `true` if an object is cached for `key`
    #[inline]
    pub fn has(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    /// Stores an object, replacing whatever was cached for `key`
    pub fn set(&self, key: CacheKey, object: Object) {
        let slot = Arc::clone(self.slots.entry(key).or_default().value());
        *slot.lock() = Some(object);
    }

    /// Number of cached objects
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().lock().is_some())
            .count()
    }

    /// Returns `true` if nothing is cached
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of disposables waiting for this cache to be disposed
    #[inline]
    pub fn tracked_count(&self) -> usize {
        self.tracked.lock().len()
    }

    /// Returns the cached object or builds, caches and tracks a new one.
    ///
    /// The slot lock is held while building.
    pub(crate) fn get_or_build<F>(&self, key: CacheKey, build: F) -> Result<Object, Error>
    where
        F: FnOnce() -> Result<Built, Error>,
    {
        let slot = Arc::clone(self.slots.entry(key.clone()).or_default().value());
        let mut cached = slot.lock();
        if let Some(object) = cached.as_ref() {
            tracing::trace!(plugin_type = %key.plugin_type(), "cache hit");
            return Ok(object.clone());
        }

        let (object, disposable) = build()?;
        *cached = Some(object.clone());
        if let Some(disposable) = disposable {
            let description = key.plugin_type().to_string();
            self.track(Tracked::new(Some(key), description, disposable));
        }
        Ok(object)
    }

    /// Remembers a disposable until the cache is disposed.
    ///
    /// Once the cache is closed there is nobody left to dispose it later,
    /// so the object is disposed right away.
    pub(crate) fn track(&self, tracked: Tracked) {
        let mut list = self.tracked.lock();
        if !self.closed.load(Ordering::Acquire) {
            list.push(tracked);
            return;
        }
        drop(list);
        tracing::debug!(object = tracked.description(), "built after disposal, disposing now");
        // failures were already logged by `dispose_all`
        let _ = dispose_all(vec![tracked]);
    }

    /// Returns `true` once [`ObjectCache::close`] was called
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Removes every entry matching `predicate`, disposing what was tracked for it
    pub fn eject_where<P>(&self, predicate: P) -> Result<(), Error>
    where
        P: Fn(&CacheKey) -> bool,
    {
        self.slots.retain(|key, _| !predicate(key));
        let ejected = {
            let mut tracked = self.tracked.lock();
            let (ejected, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *tracked)
                .into_iter()
                .partition(|t| t.key().is_some_and(&predicate));
            *tracked = kept;
            ejected
        };
        into_result(dispose_all(ejected))
    }

    /// Removes one entry, disposing it if it was tracked
    #[inline]
    pub fn eject(&self, key: &CacheKey) -> Result<(), Error> {
        self.eject_where(|k| k == key)
    }

    /// Disposes every tracked object and clears the cache.
    ///
    /// Tracked objects are taken out before disposing, so a second call
    /// (or a re-entrant one) finds nothing left to dispose.
    pub fn dispose_and_clear(&self) -> Result<(), Error> {
        let tracked = std::mem::take(&mut *self.tracked.lock());
        self.slots.clear();
        into_result(dispose_all(tracked))
    }

    /// Disposes and clears the cache for good.
    ///
    /// Objects whose build was still running are disposed as soon as they are tracked.
    pub fn close(&self) -> Result<(), Error> {
        let tracked = {
            let mut list = self.tracked.lock();
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *list)
        };
        self.slots.clear();
        into_result(dispose_all(tracked))
    }
}

#[inline]
fn into_result(failures: Vec<crate::dispose::DisposeFailure>) -> Result<(), Error> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Disposal(failures))
    }
}
