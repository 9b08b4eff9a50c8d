//! Per-instance dependency overrides

use crate::{
    instance::{Instance, Object},
    plugin_type::PluginType,
};
use std::{
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// Identifies which parameter of a recipe a dependency override applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyKey {
    /// A parameter with this name
    Name(String),
    /// Any parameter of this plugin type
    Type(PluginType),
}

impl DependencyKey {
    /// Creates a key matching a parameter by name
    #[inline]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Creates a key matching parameters of the Rust type `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(PluginType::of::<T>())
    }
}

/// How an overridden parameter is satisfied
#[derive(Clone)]
pub enum Dependency {
    /// A literal value, type-checked against the parameter
    Value(Object),
    /// An inline instance built through the session
    Instance(Arc<Instance>),
    /// The registered instance with this name
    Named(String),
    /// The default instance of the parameter type
    Default,
}

impl Dependency {
    /// Creates a literal value dependency
    #[inline]
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::Value(Arc::new(value))
    }

    /// Creates an inline instance dependency
    #[inline]
    pub fn instance(instance: impl Into<Arc<Instance>>) -> Self {
        Self::Instance(instance.into())
    }

    /// Pins the parameter to a registered instance name
    #[inline]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl Debug for Dependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Value(_) => f.write_str("Value(..)"),
            Dependency::Instance(instance) => f.debug_tuple("Instance").field(&instance.name()).finish(),
            Dependency::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Dependency::Default => f.write_str("Default"),
        }
    }
}

/// Dependency overrides of one instance
#[derive(Debug, Clone, Default)]
pub(crate) struct Dependencies(Vec<(DependencyKey, Dependency)>);

impl Dependencies {
    /// Adds or replaces an override
    pub(crate) fn set(&mut self, key: DependencyKey, dependency: Dependency) {
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = dependency,
            None => self.0.push((key, dependency)),
        }
    }

    /// Adds every override of `other`, replacing overrides with the same key
    pub(crate) fn extend(&mut self, other: Dependencies) {
        for (key, dependency) in other.0 {
            self.set(key, dependency);
        }
    }

    /// Finds the override for a parameter: by name first, then by type
    pub(crate) fn find(&self, name: &str, plugin_type: &PluginType) -> Option<&Dependency> {
        self.find_key(|k| matches!(k, DependencyKey::Name(n) if n == name))
            .or_else(|| self.find_key(|k| matches!(k, DependencyKey::Type(t) if t == plugin_type)))
    }

    #[inline]
    fn find_key(&self, predicate: impl Fn(&DependencyKey) -> bool) -> Option<&Dependency> {
        self.0.iter().find(|(k, _)| predicate(k)).map(|(_, d)| d)
    }
}
