//! Per-call explicit argument overrides

use crate::{
    error::Error,
    instance::{Object, downcast},
    plugin_type::PluginType,
};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Values supplied for a single resolution call.
///
/// An argument keyed by plugin type replaces the default of that type anywhere
/// in the object graph built by the call; an argument keyed by name replaces
/// every constructor or setter parameter with that name. Arguments are never
/// stored in the container.
///
/// # Example
/// ```
/// use wirebox::ExplicitArguments;
///
/// let args = ExplicitArguments::new()
///     .set(String::from("orders"))
///     .with("timeout", 30_u64);
///
/// assert_eq!(args.get::<String>().unwrap().as_str(), "orders");
/// assert_eq!(*args.get_named::<u64>("timeout").unwrap(), 30);
/// ```
#[derive(Default, Clone)]
pub struct ExplicitArguments {
    by_type: HashMap<PluginType, Object>,
    by_name: HashMap<String, Object>,
}

impl Debug for ExplicitArguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplicitArguments")
            .field("types", &self.by_type.keys().collect::<Vec<_>>())
            .field("names", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExplicitArguments {
    /// Creates an empty set of arguments
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies `value` for the plugin type `T`
    #[inline]
    pub fn set<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.set_shared(Arc::new(value))
    }

    /// Supplies a shared `value` for the plugin type `T`
    #[inline]
    pub fn set_shared<T: Send + Sync + 'static>(self, value: Arc<T>) -> Self {
        self.set_object(PluginType::of::<T>(), value)
    }

    /// Supplies an object for an arbitrary plugin type
    pub fn set_object(mut self, plugin_type: PluginType, object: Object) -> Self {
        self.by_type.insert(plugin_type, object);
        self
    }

    /// Supplies `value` for every parameter named `name`
    #[inline]
    pub fn with<T: Send + Sync + 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with_shared(name, Arc::new(value))
    }

    /// Supplies a shared `value` for every parameter named `name`
    pub fn with_shared<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.by_name.insert(name.into(), value);
        self
    }

    /// The object supplied for `plugin_type`
    #[inline]
    pub fn by_type(&self, plugin_type: &PluginType) -> Option<&Object> {
        self.by_type.get(plugin_type)
    }

    /// The object supplied for the parameter `name`
    #[inline]
    pub fn by_name(&self, name: &str) -> Option<&Object> {
        self.by_name.get(name)
    }

    /// The value supplied for `T`, if any
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.by_type(&PluginType::of::<T>())
            .and_then(|object| object.clone().downcast::<T>().ok())
    }

    /// The value supplied for the parameter `name`, cast to `T`
    pub fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        let object = self
            .by_name(name)
            .ok_or_else(|| Error::MissingArgument(name.to_owned()))?;
        downcast(object.clone(), &PluginType::named(name.to_owned()))
    }

    /// Returns `true` if no argument is supplied
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_name.is_empty()
    }
}
