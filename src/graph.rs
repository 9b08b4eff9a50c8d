//! Registry of plugin families

use crate::{
    error::Error,
    instance::{Instance, InstanceId},
    lifecycle::{Lifecycle, LifecycleCache, NoContext},
    pipeline::{Pipeline, Registration},
    plugin_type::PluginType,
};
use dashmap::DashMap;
use std::sync::Arc;

pub use family::Family;

pub mod family;

/// Maps plugin types to their [`Family`] of instances.
///
/// Families are immutable snapshots: readers clone an `Arc<Family>` out of the
/// map and mutation replaces the snapshot (copy-on-write).
/// Families of closed generic types without registrations of their own are
/// derived from the open generic family on first access and remembered until
/// the open family changes.
///
/// A graph is also a [`Pipeline`] without lifecycle caches, so a
/// [`Session`](crate::Session) can resolve from it directly.
#[derive(Debug, Default)]
pub struct PluginGraph {
    families: DashMap<PluginType, Arc<Family>>,
    closed: DashMap<PluginType, Arc<Family>>,
}

impl PluginGraph {
    /// Creates an empty graph
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the family of `plugin_type`, adding an empty one if needed
    pub fn add_family(&self, plugin_type: PluginType) -> Arc<Family> {
        self.families
            .entry(plugin_type.clone())
            .or_insert_with(|| Arc::new(Family::new(plugin_type)))
            .value()
            .clone()
    }

    /// Returns the family of `plugin_type`.
    ///
    /// Closed generic types are derived from their open generic family;
    /// anything else unknown gets an empty family.
    pub fn family(&self, plugin_type: &PluginType) -> Arc<Family> {
        self.find_family(plugin_type)
            .unwrap_or_else(|| self.add_family(plugin_type.clone()))
    }

    /// Returns the registered or derived family of `plugin_type` without adding one
    pub fn find_family(&self, plugin_type: &PluginType) -> Option<Arc<Family>> {
        if let Some(family) = self.families.get(plugin_type) {
            return Some(family.value().clone());
        }
        if let Some(family) = self.closed.get(plugin_type) {
            return Some(family.value().clone());
        }
        let definition = plugin_type.generic_definition()?;
        let open = self.families.get(&definition)?.value().clone();
        tracing::trace!(plugin_type = %plugin_type, "closing generic family");
        let derived = self
            .closed
            .entry(plugin_type.clone())
            .or_insert_with(|| Arc::new(open.close(plugin_type.clone())))
            .value()
            .clone();
        Some(derived)
    }

    /// Returns `true` if `plugin_type` has registrations of its own
    #[inline]
    pub fn has_family(&self, plugin_type: &PluginType) -> bool {
        self.families.contains_key(plugin_type)
    }

    /// The instance of `plugin_type` named `name`
    pub fn instance(&self, plugin_type: &PluginType, name: &str) -> Option<Arc<Instance>> {
        self.find_family(plugin_type)
            .and_then(|family| family.instance(name).cloned())
    }

    /// Adds an instance to the family of `plugin_type`
    pub fn add_instance(&self, plugin_type: PluginType, instance: impl Into<Arc<Instance>>) {
        let instance = instance.into();
        self.update(plugin_type, |family| family.add(instance));
    }

    /// Adds an instance and makes it the default of `plugin_type`
    pub fn set_default(&self, plugin_type: PluginType, instance: impl Into<Arc<Instance>>) {
        let instance = instance.into();
        self.update(plugin_type, |family| family.set_default(instance));
    }

    /// Makes the instance named `name` the default of `plugin_type`
    pub fn set_default_name(&self, plugin_type: PluginType, name: impl Into<String>) {
        let name = name.into();
        self.update(plugin_type, |family| family.set_default_name(name));
    }

    /// Sets the lifecycle of the whole family of `plugin_type`
    pub fn set_lifecycle(&self, plugin_type: PluginType, lifecycle: Lifecycle) {
        self.update(plugin_type, |family| family.set_lifecycle(lifecycle));
    }

    /// Removes the family of `plugin_type` and returns it
    pub fn remove_family(&self, plugin_type: &PluginType) -> Option<Arc<Family>> {
        let removed = self.families.remove(plugin_type).map(|(_, family)| family);
        self.invalidate(plugin_type);
        removed
    }

    /// Removes the instance of `plugin_type` named `name` and returns it
    pub fn remove_instance(&self, plugin_type: &PluginType, name: &str) -> Option<Arc<Instance>> {
        let removed = self
            .families
            .get_mut(plugin_type)
            .and_then(|mut family| Arc::make_mut(family.value_mut()).remove(name));
        if removed.is_some() {
            self.invalidate(plugin_type);
        }
        removed
    }

    /// Identities of the instances named `name` derived so far from the open
    /// generic family `plugin_type`
    pub(crate) fn closed_instance_ids(&self, plugin_type: &PluginType, name: &str) -> Vec<InstanceId> {
        if !plugin_type.is_open() {
            return Vec::new();
        }
        self.closed
            .iter()
            .filter(|family| family.key().generic_definition().as_ref() == Some(plugin_type))
            .filter_map(|family| family.value().instance(name).map(|instance| instance.id()))
            .collect()
    }

    /// Imports every family of `other`
    pub fn merge(&self, other: &PluginGraph) {
        for family in other.families() {
            self.update(family.plugin_type().clone(), |existing| existing.merge(&family));
        }
    }

    /// Snapshot of every registered family
    pub fn families(&self) -> Vec<Arc<Family>> {
        self.families
            .iter()
            .map(|family| family.value().clone())
            .collect()
    }

    /// Number of registered families
    #[inline]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns `true` if nothing is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    fn update<F>(&self, plugin_type: PluginType, mutate: F)
    where
        F: FnOnce(&mut Family),
    {
        {
            let mut entry = self
                .families
                .entry(plugin_type.clone())
                .or_insert_with(|| Arc::new(Family::new(plugin_type.clone())));
            mutate(Arc::make_mut(entry.value_mut()));
        }
        self.invalidate(&plugin_type);
    }

    fn invalidate(&self, plugin_type: &PluginType) {
        self.closed.remove(plugin_type);
        if plugin_type.is_open() {
            self.closed
                .retain(|closed, _| closed.generic_definition().as_ref() != Some(plugin_type));
        }
    }

    fn registration(&self, family: &Family, instance: &Arc<Instance>) -> Registration {
        let lifecycle = instance
            .lifecycle()
            .or(family.lifecycle())
            .unwrap_or_default();
        Registration::new(family.plugin_type().clone(), instance.clone(), lifecycle)
    }
}

impl Pipeline for PluginGraph {
    fn default_for(&self, plugin_type: &PluginType) -> Result<Option<Registration>, Error> {
        let Some(family) = self.find_family(plugin_type) else {
            return Ok(None);
        };
        let registration = family
            .default_instance()?
            .map(|instance| self.registration(&family, instance));
        Ok(registration)
    }

    fn named(&self, plugin_type: &PluginType, name: &str) -> Result<Option<Registration>, Error> {
        let registration = self.find_family(plugin_type).and_then(|family| {
            family
                .instance(name)
                .map(|instance| self.registration(&family, instance))
        });
        Ok(registration)
    }

    fn all(&self, plugin_type: &PluginType) -> Result<Vec<Registration>, Error> {
        let registrations = self
            .find_family(plugin_type)
            .map(|family| {
                family
                    .instances()
                    .map(|instance| self.registration(&family, instance))
                    .collect()
            })
            .unwrap_or_default();
        Ok(registrations)
    }

    fn inline(&self, plugin_type: &PluginType, instance: Arc<Instance>) -> Registration {
        let lifecycle = instance.lifecycle().unwrap_or_default();
        Registration::new(plugin_type.clone(), instance, lifecycle)
    }

    #[inline]
    fn cache_for(&self, registration: &Registration) -> LifecycleCache {
        registration.lifecycle().find_cache(&NoContext)
    }
}
