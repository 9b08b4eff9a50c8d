//! Dependency Injection container hierarchy

use crate::{
    Dispose,
    args::ExplicitArguments,
    cache::ObjectCache,
    config::ContainerConfig,
    dispose::{DisposeFailure, Tracked, dispose_all},
    error::Error,
    graph::{Family, PluginGraph},
    instance::{Instance, Object, downcast},
    lifecycle::{Lifecycle, LifecycleCache, LifecycleContext},
    pipeline::{Pipeline, Registration},
    plugin_type::PluginType,
    session::{Session, optional},
};
use dashmap::DashMap;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    fmt::{Debug, Display, Formatter},
    sync::{
        Arc, Weak,
        atomic::{AtomicU8, Ordering},
    },
    thread::{self, ThreadId},
};

pub use builder::ContainerBuilder;

pub mod builder;

const ACTIVE: u8 = 0;
const DISPOSING: u8 = 1;
const DISPOSED: u8 = 2;

/// The position of a container in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// The container created by [`ContainerBuilder::build`]
    Root,
    /// A long-lived child with its own registrations, singletons and caches
    Child,
    /// A short-lived unit of work, the ambient scope of [`Lifecycle::Hybrid`]
    Nested,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ContainerKind::Root => "root",
            ContainerKind::Child => "child",
            ContainerKind::Nested => "nested",
        };
        f.write_str(kind)
    }
}

struct Scope {
    name: String,
    kind: ContainerKind,
    config: ContainerConfig,
    graph: PluginGraph,
    profiles: DashMap<String, Arc<PluginGraph>>,
    parent: Option<Arc<Scope>>,
    singletons: Arc<ObjectCache>,
    scoped: Arc<ObjectCache>,
    thread_local: DashMap<ThreadId, Arc<ObjectCache>>,
    transients: Option<Arc<ObjectCache>>,
    children: Mutex<Vec<Weak<Scope>>>,
    state: AtomicU8,
}

impl Scope {
    fn new(
        name: String,
        kind: ContainerKind,
        config: ContainerConfig,
        graph: PluginGraph,
        parent: Option<Arc<Scope>>,
    ) -> Self {
        let tracks_transients = kind != ContainerKind::Root || config.root_transient_tracking();
        Self {
            name,
            kind,
            config,
            graph,
            profiles: DashMap::new(),
            parent,
            singletons: Arc::default(),
            scoped: Arc::default(),
            thread_local: DashMap::new(),
            transients: tracks_transients.then(Arc::default),
            children: Mutex::new(Vec::new()),
            state: AtomicU8::new(ACTIVE),
        }
    }

    /// This scope followed by its ancestors up to the root
    #[inline]
    fn chain(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.parent.as_deref())
    }

    #[inline]
    fn ancestor(&self, depth: usize) -> &Scope {
        self.chain().nth(depth).unwrap_or(self)
    }

    fn add_profiles(&self, profiles: HashMap<String, PluginGraph>) {
        for (name, graph) in profiles {
            self.profiles.entry(name).or_default().merge(&graph);
        }
    }

    /// The nearest registrations of the profile `name`
    fn profile(&self, name: &str) -> Option<Arc<PluginGraph>> {
        self.chain()
            .find_map(|scope| scope.profiles.get(name).map(|graph| graph.value().clone()))
    }

    fn family_lifecycle(&self, plugin_type: &PluginType) -> Option<Lifecycle> {
        self.chain()
            .find_map(|scope| scope.graph.find_family(plugin_type).and_then(|f| f.lifecycle()))
    }

    fn thread_cache(&self) -> Arc<ObjectCache> {
        self.thread_local
            .entry(thread::current().id())
            .or_default()
            .value()
            .clone()
    }

    /// Own caches in disposal order
    fn caches(&self) -> Vec<Arc<ObjectCache>> {
        self.transients
            .iter()
            .cloned()
            .chain([self.scoped.clone()])
            .chain(self.thread_local.iter().map(|cache| cache.value().clone()))
            .chain([self.singletons.clone()])
            .collect()
    }

    fn dispose(&self) -> Result<(), Error> {
        if self
            .state
            .compare_exchange(ACTIVE, DISPOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        tracing::debug!(container = %self.name, kind = %self.kind, "disposing container");
        if let Some(parent) = &self.parent {
            parent
                .children
                .lock()
                .retain(|child| child.strong_count() > 0 && !std::ptr::eq(child.as_ptr(), self));
        }

        let mut failures = Vec::new();
        let children = std::mem::take(&mut *self.children.lock());
        for child in children.iter().filter_map(Weak::upgrade) {
            absorb(child.dispose(), &mut failures);
        }
        for cache in self.caches() {
            absorb(cache.close(), &mut failures);
        }
        let prebuilt = self
            .graph
            .families()
            .iter()
            .flat_map(|family| family.prebuilt_disposables().collect::<Vec<_>>())
            .collect::<Vec<Tracked>>();
        failures.extend(dispose_all(prebuilt));

        self.state.store(DISPOSED, Ordering::Release);
        tracing::debug!(container = %self.name, failures = failures.len(), "container disposed");
        into_result(failures)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if *self.state.get_mut() != ACTIVE {
            return;
        }
        tracing::debug!(container = %self.name, "container dropped without disposal");
        if let Err(err) = self.dispose() {
            tracing::warn!(container = %self.name, error = %err, "failed to dispose a dropped container");
        }
    }
}

struct ScopeContext<'a> {
    caller: &'a Scope,
    owner: &'a Scope,
}

impl LifecycleContext for ScopeContext<'_> {
    fn singletons(&self) -> Option<Arc<ObjectCache>> {
        Some(self.owner.singletons.clone())
    }

    fn container_cache(&self) -> Option<Arc<ObjectCache>> {
        Some(self.caller.scoped.clone())
    }

    fn thread_local_cache(&self) -> Option<Arc<ObjectCache>> {
        Some(self.caller.thread_cache())
    }

    fn ambient_cache(&self) -> Option<Arc<ObjectCache>> {
        self.caller
            .chain()
            .find(|scope| scope.kind == ContainerKind::Nested)
            .map(|scope| scope.scoped.clone())
    }

    fn transients(&self) -> Option<Arc<ObjectCache>> {
        self.caller.transients.clone()
    }
}

/// Represents a DI container that builds and caches services.
///
/// Cloning a container is cheap; every clone refers to the same scope.
///
/// A container resolves through its own registrations first and then through
/// those of its parents. [`Container::create_child_container`] and
/// [`Container::get_nested_container`] create scopes whose registrations are
/// invisible to the parent and to siblings, and whose caches are disposed with
/// them.
///
/// A container whose last handle is dropped without calling
/// [`Container::dispose`] is disposed at that point.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use wirebox::{ContainerBuilder, Instance};
///
/// trait Widget: Send + Sync {
///     fn color(&self) -> &'static str;
/// }
///
/// struct Purple;
///
/// impl Widget for Purple {
///     fn color(&self) -> &'static str { "purple" }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.use_default::<Arc<dyn Widget>>(Instance::lambda(|_| Ok(Arc::new(Purple) as Arc<dyn Widget>)));
///
/// let container = builder.build();
/// let child = container.create_child_container().unwrap();
///
/// assert_eq!(child.get::<Arc<dyn Widget>>().unwrap().color(), "purple");
/// ```
#[derive(Clone)]
pub struct Container {
    scope: Arc<Scope>,
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.scope.name)
            .field("kind", &self.scope.kind)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty root container
    #[inline]
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    pub(crate) fn root(graph: PluginGraph, profiles: HashMap<String, PluginGraph>, config: ContainerConfig) -> Self {
        let name = config.name().to_owned();
        tracing::debug!(container = %name, families = graph.len(), profiles = profiles.len(), "container created");
        let scope = Scope::new(name, ContainerKind::Root, config, graph, None);
        scope.add_profiles(profiles);
        Self { scope: Arc::new(scope) }
    }

    /// Name of the container, used in logs
    #[inline]
    pub fn name(&self) -> &str {
        &self.scope.name
    }

    /// Position of the container in the hierarchy
    #[inline]
    pub fn kind(&self) -> ContainerKind {
        self.scope.kind
    }

    /// Returns `true` once disposal has started
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.scope.state.load(Ordering::Acquire) != ACTIVE
    }

    #[inline]
    fn ensure_active(&self) -> Result<(), Error> {
        if self.is_disposed() {
            Err(Error::ContainerDisposed)
        } else {
            Ok(())
        }
    }

    /// Creates a child container.
    ///
    /// A child resolves everything its parent does, but its own registrations,
    /// singletons and caches stay private to it. Dropping the last handle to a
    /// child that was never disposed disposes it.
    #[inline]
    pub fn create_child_container(&self) -> Result<Container, Error> {
        self.spawn(ContainerKind::Child)
    }

    /// Creates a nested container for a unit of work.
    ///
    /// A nested container is the ambient scope of [`Lifecycle::Hybrid`] objects
    /// and cannot hold singletons of its own.
    #[inline]
    pub fn get_nested_container(&self) -> Result<Container, Error> {
        self.spawn(ContainerKind::Nested)
    }

    /// Returns a container that resolves the registrations of the profile `name`
    /// before those of this container.
    ///
    /// Profiles are looked up in this container and then in its parents. An
    /// unknown profile adds nothing, so the result resolves like this container.
    /// Each call returns a new child container; singletons registered by the
    /// profile are cached in it and disposed with it.
    pub fn get_profile(&self, name: &str) -> Result<Container, Error> {
        let graph = PluginGraph::new();
        match self.scope.profile(name) {
            Some(profile) => graph.merge(&profile),
            None => tracing::debug!(container = %self.scope.name, profile = name, "unknown profile"),
        }
        self.spawn_with(format!("{}.profile[{name}]", self.scope.name), ContainerKind::Child, graph)
    }

    /// Names of the profiles visible from this container
    pub fn profiles(&self) -> Vec<String> {
        let mut names = self
            .scope
            .chain()
            .flat_map(|scope| scope.profiles.iter().map(|p| p.key().clone()).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        names.sort();
        names.dedup();
        names
    }

    #[inline]
    fn spawn(&self, kind: ContainerKind) -> Result<Container, Error> {
        self.spawn_with(format!("{}.{kind}", self.scope.name), kind, PluginGraph::new())
    }

    fn spawn_with(&self, name: String, kind: ContainerKind, graph: PluginGraph) -> Result<Container, Error> {
        self.ensure_active()?;
        let scope = Arc::new(Scope::new(
            name,
            kind,
            self.scope.config.clone(),
            graph,
            Some(self.scope.clone()),
        ));
        {
            let mut children = self.scope.children.lock();
            children.retain(|child| child.strong_count() > 0);
            children.push(Arc::downgrade(&scope));
        }
        tracing::debug!(container = %scope.name, parent = %self.scope.name, "container created");
        Ok(Self { scope })
    }

    /// Adds registrations to this container's own layer
    pub fn configure<F>(&self, configure: F) -> Result<(), Error>
    where
        F: FnOnce(&mut ContainerBuilder),
    {
        self.ensure_active()?;
        let mut builder = ContainerBuilder::new();
        configure(&mut builder);
        let (graph, profiles) = builder.into_parts();
        if self.scope.kind == ContainerKind::Nested {
            graph.families().iter().try_for_each(|family| reject_singletons(family))?;
        }
        tracing::debug!(container = %self.scope.name, families = graph.len(), profiles = profiles.len(), "container configured");
        self.scope.graph.merge(&graph);
        self.scope.add_profiles(profiles);
        Ok(())
    }

    /// Makes `value` the default `T` of this container
    #[inline]
    pub fn inject<T: Send + Sync + 'static>(&self, value: T) -> Result<(), Error> {
        self.inject_instance(PluginType::of::<T>(), Instance::object(value))
    }

    /// Makes a shared `value` the default `T` of this container
    #[inline]
    pub fn inject_shared<T: Send + Sync + 'static>(&self, value: Arc<T>) -> Result<(), Error> {
        self.inject_instance(PluginType::of::<T>(), Instance::shared(value))
    }

    /// Makes `value` the default `T` of this container and disposes it with the container
    #[inline]
    pub fn inject_disposable<T: Dispose + 'static>(&self, value: T) -> Result<(), Error> {
        self.inject_instance(PluginType::of::<T>(), Instance::object(value).disposable::<T>())
    }

    /// Makes `instance` the default of `plugin_type` in this container
    pub fn inject_instance(&self, plugin_type: PluginType, instance: Instance) -> Result<(), Error> {
        self.ensure_active()?;
        if self.scope.kind == ContainerKind::Nested && instance.lifecycle().is_some_and(Lifecycle::is_singleton) {
            return Err(Error::SingletonInNestedContainer(plugin_type));
        }
        tracing::debug!(container = %self.scope.name, plugin_type = %plugin_type, "instance injected");
        self.scope.graph.set_default(plugin_type, instance);
        Ok(())
    }

    /// Starts a resolution that uses explicit arguments
    #[inline]
    pub fn with(&self, args: ExplicitArguments) -> Resolution<'_> {
        Resolution { container: self, args }
    }

    #[inline]
    fn resolution(&self) -> Resolution<'_> {
        self.with(ExplicitArguments::default())
    }

    /// Resolves the default `T`
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.resolution().get()
    }

    /// Resolves the default of `plugin_type` as a `T`
    #[inline]
    pub fn get_plugin<T: Send + Sync + 'static>(&self, plugin_type: &PluginType) -> Result<Arc<T>, Error> {
        self.resolution().get_plugin(plugin_type)
    }

    /// Resolves the `T` named `name`
    #[inline]
    pub fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, Error> {
        self.resolution().get_named(name)
    }

    /// Resolves every registered `T`
    #[inline]
    pub fn get_all<T: Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, Error> {
        self.resolution().get_all()
    }

    /// Resolves the default `T`, or `None` if it is not configured or ambiguous
    #[inline]
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, Error> {
        self.resolution().try_get()
    }

    /// Resolves the `T` named `name`, or `None` if there is none
    #[inline]
    pub fn try_get_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Option<Arc<T>>, Error> {
        self.resolution().try_get_named(name)
    }

    /// Builds `instance` as a `T` without registering it.
    ///
    /// Its dependencies resolve through this container. The instance's own
    /// lifecycle applies, or the configured default lifecycle if it has none.
    #[inline]
    pub fn get_instance<T: Send + Sync + 'static>(&self, instance: Instance) -> Result<Arc<T>, Error> {
        self.resolution().get_instance(instance)
    }

    /// Resolves the default `T` and returns a clone of it.
    /// `T` must implement [`Clone`] otherwise use [`Container::get`] method
    /// that returns a shared pointer.
    #[inline]
    pub fn resolve<T: Send + Sync + Clone + 'static>(&self) -> Result<T, Error> {
        self.resolution().resolve()
    }

    /// Resolves the default object of `plugin_type`
    #[inline]
    pub fn object(&self, plugin_type: &PluginType) -> Result<Object, Error> {
        self.resolution().object(plugin_type)
    }

    /// Resolves the default object of `plugin_type`, or `None` if it is not configured
    #[inline]
    pub fn try_object(&self, plugin_type: &PluginType) -> Result<Option<Object>, Error> {
        self.resolution().try_object(plugin_type)
    }

    /// Resolves the object of `plugin_type` named `name`
    #[inline]
    pub fn named_object(&self, plugin_type: &PluginType, name: &str) -> Result<Object, Error> {
        self.resolution().named_object(plugin_type, name)
    }

    /// Resolves an object for every instance of `plugin_type`
    #[inline]
    pub fn all_objects(&self, plugin_type: &PluginType) -> Result<Vec<Object>, Error> {
        self.resolution().all_objects(plugin_type)
    }

    /// Disposes and forgets every object this container cached for `lifecycle`.
    ///
    /// For [`Lifecycle::Transient`] and [`Lifecycle::PerRequest`] this disposes the
    /// objects the container tracked for the caller.
    pub fn eject_all(&self, lifecycle: Lifecycle) -> Result<(), Error> {
        self.ensure_active()?;
        tracing::debug!(container = %self.scope.name, lifecycle = %lifecycle, "ejecting");
        if lifecycle == Lifecycle::ThreadLocal {
            return self.dispose_thread_caches();
        }
        let context = ScopeContext { caller: &self.scope, owner: &self.scope };
        lifecycle.eject_all(&context)
    }

    /// Removes the registrations of `plugin_type` from this container's own layer
    /// and disposes every object it cached for it
    pub fn eject_all_instances_of(&self, plugin_type: &PluginType) -> Result<(), Error> {
        self.ensure_active()?;
        tracing::debug!(container = %self.scope.name, plugin_type = %plugin_type, "ejecting instances");
        let matches = |key: &crate::cache::CacheKey| {
            key.plugin_type() == plugin_type || key.plugin_type().generic_definition().as_ref() == Some(plugin_type)
        };

        let mut failures = Vec::new();
        for cache in self.scope.caches() {
            absorb(cache.eject_where(matches), &mut failures);
        }
        if let Some(family) = self.scope.graph.remove_family(plugin_type) {
            failures.extend(dispose_all(family.prebuilt_disposables().collect()));
        }
        into_result(failures)
    }

    /// Removes the instance of `plugin_type` named `name` from this container's
    /// own layer and disposes every object this container cached for it.
    ///
    /// If it was the default, the next instance of the family becomes the
    /// default. Removing an unknown instance does nothing.
    pub fn eject_and_remove(&self, plugin_type: &PluginType, name: &str) -> Result<(), Error> {
        self.ensure_active()?;
        let mut ids = self.scope.graph.closed_instance_ids(plugin_type, name);
        let Some(instance) = self.scope.graph.remove_instance(plugin_type, name) else {
            return Ok(());
        };
        tracing::debug!(container = %self.scope.name, plugin_type = %plugin_type, instance = name, "instance removed");
        ids.push(instance.id());
        let ids = ids.into_iter().collect::<HashSet<_>>();

        let mut failures = Vec::new();
        for cache in self.scope.caches() {
            absorb(cache.eject_where(|key| ids.contains(&key.instance())), &mut failures);
        }
        if let Some(disposable) = instance.prebuilt().and_then(|object| instance.disposable_of(object)) {
            let description = format!("{plugin_type} ('{name}')");
            failures.extend(dispose_all(vec![Tracked::new(None, description, disposable)]));
        }
        into_result(failures)
    }

    /// Disposes the container.
    ///
    /// Spawned child and nested containers are disposed first, then every
    /// disposable object this container cached or tracked, then the disposable
    /// objects registered in its own layer. Every object is attempted even if
    /// some fail. Parents and siblings are never touched.
    ///
    /// Disposal is terminal and happens once; later calls, including calls made
    /// by objects while they are being disposed, do nothing. An object whose
    /// build was already running when disposal started is disposed as soon as
    /// that build completes.
    #[inline]
    pub fn dispose(&self) -> Result<(), Error> {
        self.scope.dispose()
    }

    fn dispose_thread_caches(&self) -> Result<(), Error> {
        let caches = self
            .scope
            .thread_local
            .iter()
            .map(|cache| cache.value().clone())
            .collect::<Vec<_>>();
        let mut failures = Vec::new();
        for cache in caches {
            absorb(cache.dispose_and_clear(), &mut failures);
        }
        into_result(failures)
    }

    fn registration(&self, plugin_type: &PluginType, instance: Arc<Instance>, owner: usize) -> Registration {
        let lifecycle = instance
            .lifecycle()
            .or_else(|| self.scope.family_lifecycle(plugin_type))
            .unwrap_or(self.scope.config.default_lifecycle());
        Registration::owned_by(plugin_type.clone(), instance, lifecycle, owner)
    }
}

impl Pipeline for Container {
    fn default_for(&self, plugin_type: &PluginType) -> Result<Option<Registration>, Error> {
        let mut candidates: IndexMap<String, (usize, Arc<Instance>)> = IndexMap::new();
        for (depth, scope) in self.scope.chain().enumerate() {
            let Some(family) = scope.graph.find_family(plugin_type) else {
                continue;
            };
            if let Some(name) = family.default_name() {
                let designated = candidates.swap_remove(name).or_else(|| {
                    self.scope
                        .chain()
                        .enumerate()
                        .skip(depth)
                        .find_map(|(owner, scope)| scope.graph.instance(plugin_type, name).map(|i| (owner, i)))
                });
                if let Some((owner, instance)) = designated {
                    return Ok(Some(self.registration(plugin_type, instance, owner)));
                }
            }
            for instance in family.instances() {
                candidates
                    .entry(instance.name().to_owned())
                    .or_insert_with(|| (depth, instance.clone()));
            }
        }

        if candidates.len() > 1 {
            return Err(Error::AmbiguousDefault {
                plugin_type: plugin_type.clone(),
                instances: candidates.into_keys().collect(),
            });
        }
        let registration = candidates
            .into_values()
            .next()
            .map(|(owner, instance)| self.registration(plugin_type, instance, owner));
        Ok(registration)
    }

    fn named(&self, plugin_type: &PluginType, name: &str) -> Result<Option<Registration>, Error> {
        let registration = self
            .scope
            .chain()
            .enumerate()
            .find_map(|(depth, scope)| scope.graph.instance(plugin_type, name).map(|i| (depth, i)))
            .map(|(owner, instance)| self.registration(plugin_type, instance, owner));
        Ok(registration)
    }

    fn all(&self, plugin_type: &PluginType) -> Result<Vec<Registration>, Error> {
        let mut merged: IndexMap<String, (usize, Arc<Instance>)> = IndexMap::new();
        let layers = self.scope.chain().enumerate().collect::<Vec<_>>();
        for (depth, scope) in layers.into_iter().rev() {
            let Some(family) = scope.graph.find_family(plugin_type) else {
                continue;
            };
            for instance in family.instances() {
                merged.insert(instance.name().to_owned(), (depth, instance.clone()));
            }
        }
        let registrations = merged
            .into_values()
            .map(|(owner, instance)| self.registration(plugin_type, instance, owner))
            .collect();
        Ok(registrations)
    }

    fn inline(&self, plugin_type: &PluginType, instance: Arc<Instance>) -> Registration {
        let lifecycle = instance
            .lifecycle()
            .unwrap_or(self.scope.config.default_lifecycle());
        Registration::owned_by(plugin_type.clone(), instance, lifecycle, 0)
    }

    fn cache_for(&self, registration: &Registration) -> LifecycleCache {
        let context = ScopeContext {
            caller: &self.scope,
            owner: self.scope.ancestor(registration.owner()),
        };
        registration.lifecycle().find_cache(&context)
    }

    fn track(&self, tracked: Tracked) {
        match &self.scope.transients {
            Some(transients) => transients.track(tracked),
            None => tracing::trace!(object = tracked.description(), "not tracked, the caller owns it"),
        }
    }

    #[inline]
    fn container(&self) -> Option<Container> {
        Some(self.clone())
    }
}

/// A resolution request carrying [`ExplicitArguments`], see [`Container::with`]
#[derive(Debug)]
pub struct Resolution<'c> {
    container: &'c Container,
    args: ExplicitArguments,
}

impl<'c> Resolution<'c> {
    #[inline]
    fn session(self) -> Result<Session<'c>, Error> {
        self.container.ensure_active()?;
        Ok(Session::with_arguments(self.container, self.args))
    }

    /// Resolves the default object of `plugin_type`
    #[inline]
    pub fn object(self, plugin_type: &PluginType) -> Result<Object, Error> {
        self.session()?.get_default(plugin_type)
    }

    /// Resolves the default object of `plugin_type`, or `None` if it is not configured
    #[inline]
    pub fn try_object(self, plugin_type: &PluginType) -> Result<Option<Object>, Error> {
        self.session()?.try_get_default(plugin_type)
    }

    /// Resolves the object of `plugin_type` named `name`
    #[inline]
    pub fn named_object(self, plugin_type: &PluginType, name: &str) -> Result<Object, Error> {
        self.session()?.get_named(plugin_type, name)
    }

    /// Resolves an object for every instance of `plugin_type`
    #[inline]
    pub fn all_objects(self, plugin_type: &PluginType) -> Result<Vec<Object>, Error> {
        self.session()?.get_all(plugin_type)
    }

    /// Resolves the default `T`
    #[inline]
    pub fn get<T: Send + Sync + 'static>(self) -> Result<Arc<T>, Error> {
        self.get_plugin(&PluginType::of::<T>())
    }

    /// Resolves the default of `plugin_type` as a `T`
    #[inline]
    pub fn get_plugin<T: Send + Sync + 'static>(self, plugin_type: &PluginType) -> Result<Arc<T>, Error> {
        self.object(plugin_type)
            .and_then(|object| downcast(object, plugin_type))
    }

    /// Resolves the `T` named `name`
    #[inline]
    pub fn get_named<T: Send + Sync + 'static>(self, name: &str) -> Result<Arc<T>, Error> {
        let plugin_type = PluginType::of::<T>();
        self.named_object(&plugin_type, name)
            .and_then(|object| downcast(object, &plugin_type))
    }

    /// Resolves every registered `T`
    pub fn get_all<T: Send + Sync + 'static>(self) -> Result<Vec<Arc<T>>, Error> {
        let plugin_type = PluginType::of::<T>();
        self.all_objects(&plugin_type)?
            .into_iter()
            .map(|object| downcast(object, &plugin_type))
            .collect()
    }

    /// Resolves the default `T`, or `None` if it is not configured or ambiguous
    #[inline]
    pub fn try_get<T: Send + Sync + 'static>(self) -> Result<Option<Arc<T>>, Error> {
        optional(self.get())
    }

    /// Resolves the `T` named `name`, or `None` if there is none
    #[inline]
    pub fn try_get_named<T: Send + Sync + 'static>(self, name: &str) -> Result<Option<Arc<T>>, Error> {
        optional(self.get_named(name))
    }

    /// Builds `instance` as a `T` without registering it
    pub fn get_instance<T: Send + Sync + 'static>(self, instance: Instance) -> Result<Arc<T>, Error> {
        let plugin_type = PluginType::of::<T>();
        let registration = self.container.inline(&plugin_type, Arc::new(instance));
        self.session()?
            .get_object(&registration)
            .and_then(|object| downcast(object, &plugin_type))
    }

    /// Resolves the default `T` and returns a clone of it
    #[inline]
    pub fn resolve<T: Send + Sync + Clone + 'static>(self) -> Result<T, Error> {
        self.get::<T>().map(|t| t.as_ref().clone())
    }
}

fn reject_singletons(family: &Family) -> Result<(), Error> {
    let singleton = family.lifecycle().is_some_and(Lifecycle::is_singleton)
        || family
            .instances()
            .any(|instance| instance.lifecycle().is_some_and(Lifecycle::is_singleton));
    if singleton {
        Err(Error::SingletonInNestedContainer(family.plugin_type().clone()))
    } else {
        Ok(())
    }
}

fn absorb(result: Result<(), Error>, failures: &mut Vec<DisposeFailure>) {
    match result {
        Ok(()) => {}
        Err(Error::Disposal(nested)) => failures.extend(nested),
        Err(err) => failures.push(DisposeFailure {
            description: "container".into(),
            source: Box::new(err),
        }),
    }
}

#[inline]
fn into_result(failures: Vec<DisposeFailure>) -> Result<(), Error> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Disposal(failures))
    }
}
