//! Registration of services into a container

use crate::{
    Container,
    config::ContainerConfig,
    graph::PluginGraph,
    inject::Inject,
    instance::{GenericFactory, Instance},
    lifecycle::Lifecycle,
    plugin_type::PluginType,
    session::FromSession,
};
use std::{collections::HashMap, sync::Arc};

/// Represents a DI container builder,
/// that is able to add/register dependencies with specific lifecycles.
///
/// The same builder is handed to [`Container::configure`] to add registrations
/// to an existing container.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    graph: PluginGraph,
    profiles: HashMap<String, PluginGraph>,
    config: ContainerConfig,
}

impl ContainerBuilder {
    /// Creates a new DI container builder
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given configuration for the container being built
    #[inline]
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds a root DI container
    #[inline]
    pub fn build(self) -> Container {
        Container::root(self.graph, self.profiles, self.config)
    }

    #[inline]
    pub(crate) fn into_parts(self) -> (PluginGraph, HashMap<String, PluginGraph>) {
        (self.graph, self.profiles)
    }

    /// Adds registrations to the profile `name`.
    ///
    /// A profile is a named overlay: [`Container::get_profile`] returns a
    /// container that resolves the profile's registrations first and everything
    /// else through the container it was taken from.
    ///
    /// # Example
    /// ```
    /// use wirebox::{ContainerBuilder, Instance};
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder
    ///     .add::<String>(Instance::object(String::from("Blue")).named("Blue"))
    ///     .add::<String>(Instance::object(String::from("Red")).named("Red"))
    ///     .profile("alert", |profile| {
    ///         profile.use_named::<String>("Red");
    ///     });
    ///
    /// let container = builder.build();
    /// let alert = container.get_profile("alert").unwrap();
    ///
    /// assert_eq!(alert.get::<String>().unwrap().as_str(), "Red");
    /// ```
    pub fn profile<F>(&mut self, name: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut ContainerBuilder),
    {
        let mut profile = ContainerBuilder::new();
        configure(&mut profile);
        self.profiles
            .entry(name.into())
            .or_default()
            .merge(&profile.graph);
        self
    }

    /// Adds an instance to the family of `plugin_type`
    pub fn add_instance(&mut self, plugin_type: PluginType, instance: Instance) -> &mut Self {
        self.graph.add_instance(plugin_type, instance);
        self
    }

    /// Adds an instance and makes it the default of `plugin_type`
    pub fn set_default(&mut self, plugin_type: PluginType, instance: Instance) -> &mut Self {
        self.graph.set_default(plugin_type, instance);
        self
    }

    /// Makes the instance named `name` the default of `plugin_type`.
    ///
    /// The instance may be registered later or in a parent container.
    pub fn set_default_name(&mut self, plugin_type: PluginType, name: impl Into<String>) -> &mut Self {
        self.graph.set_default_name(plugin_type, name);
        self
    }

    /// Makes the `T` named `name` the default for the Rust type `T`
    #[inline]
    pub fn use_named<T: ?Sized + 'static>(&mut self, name: impl Into<String>) -> &mut Self {
        self.set_default_name(PluginType::of::<T>(), name)
    }

    /// Sets the lifecycle of every instance of `plugin_type` that does not override it
    pub fn set_lifecycle(&mut self, plugin_type: PluginType, lifecycle: Lifecycle) -> &mut Self {
        self.graph.set_lifecycle(plugin_type, lifecycle);
        self
    }

    /// Adds an instance for the Rust type `T`
    #[inline]
    pub fn add<T: ?Sized + 'static>(&mut self, instance: Instance) -> &mut Self {
        self.add_instance(PluginType::of::<T>(), instance)
    }

    /// Makes `instance` the default for the Rust type `T`
    #[inline]
    pub fn use_default<T: ?Sized + 'static>(&mut self, instance: Instance) -> &mut Self {
        self.set_default(PluginType::of::<T>(), instance)
    }

    /// Registers an open generic template as the default of `plugin_type`
    #[inline]
    pub fn for_generic<F>(&mut self, plugin_type: PluginType, template: F) -> &mut Self
    where
        F: Fn(&[PluginType]) -> Option<Instance> + Send + Sync + 'static,
    {
        self.set_default(plugin_type, Instance::open_generic(template))
    }

    /// Register a singleton service
    #[inline]
    pub fn register_singleton<T: Send + Sync + 'static>(&mut self, instance: T) -> &mut Self {
        self.use_default::<T>(Instance::object(instance).with_lifecycle(Lifecycle::Singleton))
    }

    /// Register a singleton service that is built on first use
    pub fn register_singleton_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        self.register_factory(factory, Lifecycle::Singleton)
    }

    /// Register a singleton service that required to be resolved as [`Default`]
    pub fn register_singleton_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register_singleton_factory(T::default)
    }

    /// Register a container-scoped service
    pub fn register_scoped_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        self.register_factory(factory, Lifecycle::ContainerScoped)
    }

    /// Register a container-scoped service that required to be resolved as [`Default`]
    pub fn register_scoped_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register_scoped_factory(T::default)
    }

    /// Register a container-scoped service that required to be resolved as [`Inject`]
    pub fn register_scoped<T: Inject + 'static>(&mut self) -> &mut Self {
        self.register_injected::<T>(Lifecycle::ContainerScoped)
    }

    /// Register a transient service
    pub fn register_transient_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        self.register_factory(factory, Lifecycle::Transient)
    }

    /// Register a transient service that required to be resolved as [`Default`]
    pub fn register_transient_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register_transient_factory(T::default)
    }

    /// Register a transient service that required to be resolved as [`Inject`]
    pub fn register_transient<T: Inject + 'static>(&mut self) -> &mut Self {
        self.register_injected::<T>(Lifecycle::Transient)
    }

    /// Register a service built once per resolution call
    pub fn register_per_request_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        self.register_factory(factory, Lifecycle::PerRequest)
    }

    /// Register a per-request service that required to be resolved as [`Default`]
    pub fn register_per_request_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static,
    {
        self.register_per_request_factory(T::default)
    }

    /// Register a per-request service that required to be resolved as [`Inject`]
    pub fn register_per_request<T: Inject + 'static>(&mut self) -> &mut Self {
        self.register_injected::<T>(Lifecycle::PerRequest)
    }

    #[inline]
    fn register_factory<T, F, Args>(&mut self, factory: F, lifecycle: Lifecycle) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        self.use_default::<T>(Instance::factory(factory).with_lifecycle(lifecycle))
    }

    #[inline]
    fn register_injected<T: Inject + 'static>(&mut self, lifecycle: Lifecycle) -> &mut Self {
        self.use_default::<T>(Instance::lambda(|session| T::inject(session)).with_lifecycle(lifecycle))
    }

    /// Registers a shared value as a singleton
    #[inline]
    pub fn register_shared<T: Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        self.use_default::<T>(Instance::shared(instance).with_lifecycle(Lifecycle::Singleton))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dc;

    #[derive(Default)]
    struct Counter;

    #[test]
    fn it_registers_defaults_with_lifecycles() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_singleton_default::<Counter>()
            .register_transient_default::<String>();

        let singleton = builder.graph.family(&PluginType::of::<Counter>());
        let transient = builder.graph.family(&PluginType::of::<String>());

        assert_eq!(singleton.default_instance().unwrap().unwrap().lifecycle(), Some(Lifecycle::Singleton));
        assert_eq!(transient.default_instance().unwrap().unwrap().lifecycle(), Some(Lifecycle::Transient));
    }

    #[test]
    fn it_replaces_the_default_on_reregistration() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_singleton(1_u32)
            .register_singleton(2_u32);

        let container = builder.build();

        assert_eq!(*container.get::<u32>().unwrap(), 2);
    }

    #[test]
    fn it_registers_per_request_factories() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_per_request_default::<Counter>()
            .register_transient_factory(|a: Dc<Counter>, b: Dc<Counter>| Ok((a.into_inner(), b.into_inner())));

        let container = builder.build();
        let (a, b) = container.resolve::<(Arc<Counter>, Arc<Counter>)>().unwrap();
        let (c, _) = container.resolve::<(Arc<Counter>, Arc<Counter>)>().unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn it_uses_the_configured_default_lifecycle() {
        let mut builder = ContainerBuilder::new()
            .with_config(ContainerConfig::new().with_default_lifecycle(Lifecycle::ContainerScoped));
        builder.add::<Counter>(Instance::lambda(|_| Ok(Counter)));

        let container = builder.build();

        assert!(Arc::ptr_eq(&container.get::<Counter>().unwrap(), &container.get::<Counter>().unwrap()));
    }

    #[test]
    fn it_collects_profiles_apart_from_the_main_registrations() {
        let mut builder = ContainerBuilder::new();
        builder
            .register_singleton(1_u32)
            .profile("test", |profile| {
                profile.register_singleton(2_u32);
            })
            .profile("test", |profile| {
                profile.register_singleton(String::from("more"));
            });

        let (graph, profiles) = builder.into_parts();

        assert_eq!(graph.len(), 1);
        assert_eq!(profiles["test"].len(), 2);
    }
}
