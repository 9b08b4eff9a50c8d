//! All instances registered for one plugin type

use crate::{
    dispose::Tracked,
    error::Error,
    instance::Instance,
    lifecycle::Lifecycle,
    plugin_type::PluginType,
};
use indexmap::IndexMap;
use std::sync::Arc;

/// The instances of one plugin type, in registration order, plus the name of
/// the default one and a lifecycle shared by all of them.
#[derive(Debug, Clone)]
pub struct Family {
    plugin_type: PluginType,
    instances: IndexMap<String, Arc<Instance>>,
    default: Option<String>,
    lifecycle: Option<Lifecycle>,
}

impl Family {
    /// Creates an empty family
    #[inline]
    pub fn new(plugin_type: PluginType) -> Self {
        Self {
            plugin_type,
            instances: IndexMap::new(),
            default: None,
            lifecycle: None,
        }
    }

    /// The plugin type of the family
    #[inline]
    pub fn plugin_type(&self) -> &PluginType {
        &self.plugin_type
    }

    /// Lifecycle applied to every instance that does not override it
    #[inline]
    pub fn lifecycle(&self) -> Option<Lifecycle> {
        self.lifecycle
    }

    /// Name of the designated default instance
    #[inline]
    pub fn default_name(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Number of instances
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if no instance is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances in registration order
    #[inline]
    pub fn instances(&self) -> impl Iterator<Item = &Arc<Instance>> {
        self.instances.values()
    }

    /// The instance registered under `name`
    #[inline]
    pub fn instance(&self, name: &str) -> Option<&Arc<Instance>> {
        self.instances.get(name)
    }

    /// The designated default, if it is registered
    #[inline]
    pub fn explicit_default(&self) -> Option<&Arc<Instance>> {
        self.default.as_deref().and_then(|name| self.instances.get(name))
    }

    /// Determines the default instance.
    ///
    /// The designated default wins; otherwise a single instance is the default.
    /// With no instances there is no default, with several it is ambiguous.
    pub fn default_instance(&self) -> Result<Option<&Arc<Instance>>, Error> {
        if let Some(instance) = self.explicit_default() {
            return Ok(Some(instance));
        }
        match self.instances.len() {
            0 => Ok(None),
            1 => Ok(self.instances.values().next()),
            _ => Err(Error::AmbiguousDefault {
                plugin_type: self.plugin_type.clone(),
                instances: self.instances.keys().cloned().collect(),
            }),
        }
    }

    /// Adds an instance, replacing any instance with the same name
    pub fn add(&mut self, instance: Arc<Instance>) {
        self.instances.insert(instance.name().to_owned(), instance);
    }

    /// Adds an instance and makes it the default
    pub fn set_default(&mut self, instance: Arc<Instance>) {
        self.default = Some(instance.name().to_owned());
        self.add(instance);
    }

    /// Makes the instance named `name` the default.
    ///
    /// The name may refer to an instance registered in a parent container.
    #[inline]
    pub fn set_default_name(&mut self, name: impl Into<String>) {
        self.default = Some(name.into());
    }

    /// Removes the instance named `name`.
    ///
    /// When it was the default, the instance registered after it (or else the
    /// one before it) becomes the default.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Instance>> {
        let (index, _, removed) = self.instances.shift_remove_full(name)?;
        if self.default.as_deref() == Some(name) {
            self.default = self
                .instances
                .get_index(index)
                .or_else(|| self.instances.last())
                .map(|(name, _)| name.clone());
        }
        Some(removed)
    }

    /// Sets the family lifecycle
    #[inline]
    pub fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = Some(lifecycle);
    }

    /// Imports another family's instances; its default and lifecycle win when set
    pub fn merge(&mut self, other: &Family) {
        for instance in other.instances() {
            self.add(instance.clone());
        }
        if other.default.is_some() {
            self.default.clone_from(&other.default);
        }
        if other.lifecycle.is_some() {
            self.lifecycle = other.lifecycle;
        }
    }

    /// Derives the family of a closed generic type by closing every instance
    pub fn close(&self, closed: PluginType) -> Family {
        let args = closed.type_arguments().to_vec();
        let mut family = Family::new(closed);
        family.lifecycle = self.lifecycle;
        for instance in self.instances() {
            if let Some(instance) = instance.close(&args) {
                family.add(Arc::new(instance));
            }
        }
        family.default = self
            .default
            .clone()
            .filter(|name| family.instances.contains_key(name) || !self.instances.contains_key(name));
        family
    }

    /// Disposal handles of the pre-built objects registered in this family
    pub(crate) fn prebuilt_disposables(&self) -> impl Iterator<Item = Tracked> + '_ {
        self.instances().filter_map(|instance| {
            let object = instance.prebuilt()?;
            let disposable = instance.disposable_of(object)?;
            Some(Tracked::new(None, format!("{} ('{}')", self.plugin_type, instance.name()), disposable))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(name: &str) -> Arc<Instance> {
        Arc::new(Instance::object(name.to_owned()).named(name))
    }

    #[test]
    fn it_uses_a_single_instance_as_default() {
        let mut family = Family::new(PluginType::named("IWidget"));
        family.add(widget("Purple"));

        let default = family.default_instance().unwrap().unwrap();

        assert_eq!(default.name(), "Purple");
    }

    #[test]
    fn it_reports_ambiguous_defaults() {
        let mut family = Family::new(PluginType::named("IWidget"));
        family.add(widget("Purple"));
        family.add(widget("DarkGreen"));

        let err = family.default_instance().unwrap_err();

        assert!(matches!(err, Error::AmbiguousDefault { ref instances, .. } if instances == &["Purple", "DarkGreen"]));
    }

    #[test]
    fn it_prefers_the_designated_default() {
        let mut family = Family::new(PluginType::named("IWidget"));
        family.add(widget("Purple"));
        family.set_default(widget("DarkGreen"));

        assert_eq!(family.default_instance().unwrap().unwrap().name(), "DarkGreen");
        assert!(Family::new(PluginType::named("IWidget")).default_instance().unwrap().is_none());
    }

    #[test]
    fn it_replaces_instances_with_the_same_name() {
        let mut family = Family::new(PluginType::named("IWidget"));
        family.add(widget("Purple"));
        let replacement = widget("Purple");
        family.add(replacement.clone());

        assert_eq!(family.len(), 1);
        assert!(Arc::ptr_eq(family.instance("Purple").unwrap(), &replacement));
    }

    #[test]
    fn it_merges_families() {
        let mut family = Family::new(PluginType::named("IWidget"));
        family.set_default(widget("Purple"));
        let mut other = Family::new(PluginType::named("IWidget"));
        other.set_default(widget("Blue"));
        other.set_lifecycle(Lifecycle::Singleton);

        family.merge(&other);

        assert_eq!(family.len(), 2);
        assert_eq!(family.default_name(), Some("Blue"));
        assert_eq!(family.lifecycle(), Some(Lifecycle::Singleton));
    }

    #[test]
    fn it_closes_generic_families() {
        let open = PluginType::open("IRepository", 1);
        let mut family = Family::new(open.clone());
        family.set_lifecycle(Lifecycle::Singleton);
        family.set_default(Arc::new(
            Instance::open_generic(|args| args[0].is::<u32>().then(|| Instance::object(0_u32))).named("Default"),
        ));

        let closed = family.close(open.close([PluginType::of::<u32>()]).unwrap());
        let unsupported = family.close(open.close([PluginType::of::<String>()]).unwrap());

        assert_eq!(closed.default_name(), Some("Default"));
        assert_eq!(closed.lifecycle(), Some(Lifecycle::Singleton));
        assert!(closed.plugin_type().is_closed_generic());
        assert!(unsupported.is_empty());
        assert_eq!(unsupported.default_name(), None);
    }

    #[test]
    fn it_promotes_the_next_instance_when_removing_the_default() {
        let mut family = Family::new(PluginType::named("IService"));
        family.set_default(widget("Service"));
        family.add(widget("Service2"));
        family.add(widget("Service3"));

        let removed = family.remove("Service").unwrap();

        assert_eq!(removed.name(), "Service");
        assert_eq!(family.len(), 2);
        assert_eq!(family.default_instance().unwrap().unwrap().name(), "Service2");
    }

    #[test]
    fn it_removes_other_instances_without_touching_the_default() {
        let mut family = Family::new(PluginType::named("IService"));
        family.add(widget("Service"));
        family.set_default(widget("Service2"));

        family.remove("Service").unwrap();

        assert!(family.remove("Missing").is_none());
        assert_eq!(family.default_name(), Some("Service2"));
        assert!(family.instance("Service").is_none());
    }

    #[test]
    fn it_keeps_a_default_name_that_points_elsewhere_when_closing() {
        let open = PluginType::open("IService", 1);
        let mut family = Family::new(open.clone());
        family.set_default_name("Service1");

        let closed = family.close(open.close([PluginType::of::<u32>()]).unwrap());

        assert_eq!(closed.default_name(), Some("Service1"));
        assert!(closed.explicit_default().is_none());
    }
}
