//! A single resolution call and its build context

use crate::{
    Container,
    args::ExplicitArguments,
    cache::{Built, CacheKey},
    dispose::Tracked,
    error::{BuildFrame, BuildPath, Error},
    instance::{Dependency, Instance, Object, Param, downcast},
    lifecycle::LifecycleCache,
    pipeline::{Pipeline, Registration},
    plugin_type::PluginType,
};
use std::{
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

pub use from_session::FromSession;

pub mod from_session;

/// The context of one top-level resolution.
///
/// A session owns the per-request cache, the explicit arguments of the call
/// and the current build path used to detect cycles. Every dependency of the
/// requested object is resolved through the same session.
///
/// # Example
/// ```
/// use wirebox::{Instance, PluginGraph, PluginType, Session};
///
/// let graph = PluginGraph::new();
/// graph.set_default(PluginType::of::<String>(), Instance::object(String::from("hello")));
///
/// let mut session = Session::new(&graph);
/// let greeting = session.get::<String>().unwrap();
///
/// assert_eq!(greeting.as_str(), "hello");
/// ```
pub struct Session<'p> {
    pipeline: &'p dyn Pipeline,
    args: ExplicitArguments,
    cache: HashMap<CacheKey, Object>,
    path: Vec<BuildFrame>,
}

impl Debug for Session<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("args", &self.args)
            .field("cached", &self.cache.len())
            .field("path", &BuildPath::new(self.path.clone()))
            .finish()
    }
}

impl<'p> Session<'p> {
    /// Creates a session over a pipeline
    #[inline]
    pub fn new(pipeline: &'p dyn Pipeline) -> Self {
        Self::with_arguments(pipeline, ExplicitArguments::default())
    }

    /// Creates a session that applies explicit arguments to everything it builds
    #[inline]
    pub fn with_arguments(pipeline: &'p dyn Pipeline, args: ExplicitArguments) -> Self {
        Self {
            pipeline,
            args,
            cache: HashMap::new(),
            path: Vec::new(),
        }
    }

    /// The container the session resolves from
    #[inline]
    pub fn container(&self) -> Result<Container, Error> {
        self.pipeline.container().ok_or(Error::ContainerMissing)
    }

    /// The explicit arguments of this call
    #[inline]
    pub fn arguments(&self) -> &ExplicitArguments {
        &self.args
    }

    /// Resolves the default object of `plugin_type`
    pub fn get_default(&mut self, plugin_type: &PluginType) -> Result<Object, Error> {
        if let Some(object) = self.args.by_type(plugin_type) {
            return Ok(object.clone());
        }
        if plugin_type.is_open() {
            return Err(Error::OpenGeneric(plugin_type.clone()));
        }
        let registration = self
            .pipeline
            .default_for(plugin_type)?
            .ok_or_else(|| Error::NotRegistered(plugin_type.clone()))?;
        self.get_object(&registration)
    }

    /// Resolves the default object of `plugin_type`, or `None` if it is not
    /// configured or ambiguous
    #[inline]
    pub fn try_get_default(&mut self, plugin_type: &PluginType) -> Result<Option<Object>, Error> {
        optional(self.get_default(plugin_type))
    }

    /// Resolves the object of the instance named `name`
    pub fn get_named(&mut self, plugin_type: &PluginType, name: &str) -> Result<Object, Error> {
        let registration = self
            .pipeline
            .named(plugin_type, name)?
            .ok_or_else(|| Error::NamedInstanceNotFound {
                plugin_type: plugin_type.clone(),
                name: name.to_owned(),
            })?;
        self.get_object(&registration)
    }

    /// Resolves the object of the instance named `name`, or `None` if there is none
    #[inline]
    pub fn try_get_named(&mut self, plugin_type: &PluginType, name: &str) -> Result<Option<Object>, Error> {
        optional(self.get_named(plugin_type, name))
    }

    /// Resolves an object for every instance of `plugin_type`
    pub fn get_all(&mut self, plugin_type: &PluginType) -> Result<Vec<Object>, Error> {
        self.pipeline
            .all(plugin_type)?
            .iter()
            .map(|registration| self.get_object(registration))
            .collect()
    }

    /// Returns the object of a registration, from its lifecycle cache or freshly built
    pub fn get_object(&mut self, registration: &Registration) -> Result<Object, Error> {
        let instance = registration.instance();
        if let Some(object) = instance.prebuilt() {
            return Ok(object.clone());
        }

        let frame = BuildFrame::new(registration.plugin_type().clone(), instance.id(), instance.name());
        if self.path.iter().any(|f| f.is_same(&frame)) {
            let mut frames = self.path.clone();
            frames.push(frame);
            return Err(Error::BidirectionalDependency(BuildPath::new(frames)));
        }

        let key = CacheKey::new(registration.plugin_type().clone(), instance.id());
        // under explicit arguments, only dependencies that are already cached are shared
        let cache = match self.pipeline.cache_for(registration) {
            LifecycleCache::Shared(shared) if !self.args.is_empty() => {
                if let Some(object) = shared.get(&key).filter(|_| !self.path.is_empty()) {
                    return Ok(object);
                }
                LifecycleCache::Request
            }
            cache => cache,
        };
        match cache {
            LifecycleCache::Unique => {
                let (object, disposable) = self.build(registration, frame)?;
                if let Some(disposable) = disposable {
                    self.pipeline
                        .track(Tracked::new(None, describe(registration), disposable));
                }
                Ok(object)
            }
            LifecycleCache::Request => {
                if let Some(object) = self.cache.get(&key) {
                    return Ok(object.clone());
                }
                let (object, disposable) = self.build(registration, frame)?;
                if let Some(disposable) = disposable {
                    self.pipeline
                        .track(Tracked::new(Some(key.clone()), describe(registration), disposable));
                }
                self.cache.insert(key, object.clone());
                Ok(object)
            }
            LifecycleCache::Shared(cache) => cache.get_or_build(key, || self.build(registration, frame)),
        }
    }

    fn build(&mut self, registration: &Registration, frame: BuildFrame) -> Result<Built, Error> {
        let instance = registration.instance();
        tracing::trace!(
            plugin_type = %registration.plugin_type(),
            instance = instance.name(),
            lifecycle = %registration.lifecycle(),
            "building"
        );

        self.path.push(frame);
        let built = instance
            .build(registration.plugin_type(), self)
            .map_err(|err| match err {
                err @ (Error::Build { .. } | Error::BidirectionalDependency(_) | Error::ContainerDisposed) => err,
                source => Error::Build {
                    path: BuildPath::new(self.path.clone()),
                    source: Box::new(source),
                },
            });
        self.path.pop();

        let object = built?;
        let disposable = instance.disposable_of(&object);
        Ok((object, disposable))
    }

    /// Resolves a constructor or setter parameter of `instance`.
    ///
    /// Explicit arguments win over the instance's dependency overrides, which
    /// win over the default of the parameter type. Within each, a match by
    /// name wins over a match by type.
    pub(crate) fn resolve_parameter(&mut self, instance: &Instance, param: &Param) -> Result<Object, Error> {
        if let Some(object) = self.args.by_name(param.name()) {
            return check_type(object, param);
        }
        if let Some(object) = self.args.by_type(param.plugin_type()) {
            return Ok(object.clone());
        }
        match instance.dependency(param.name(), param.plugin_type()) {
            Some(Dependency::Value(object)) => check_type(object, param),
            Some(Dependency::Instance(inline)) => {
                let registration = self.pipeline.inline(param.plugin_type(), inline.clone());
                self.get_object(&registration)
            }
            Some(Dependency::Named(name)) => self.get_named(param.plugin_type(), name),
            Some(Dependency::Default) | None => self.get_default(param.plugin_type()),
        }
    }

    /// Returns `true` if the parameter could be resolved without a configuration error
    pub(crate) fn can_satisfy(&self, instance: &Instance, param: &Param) -> bool {
        self.is_overridden(instance, param) || self.pipeline.has_default(param.plugin_type())
    }

    /// Returns `true` if the parameter has an explicit argument or a dependency override
    pub(crate) fn is_overridden(&self, instance: &Instance, param: &Param) -> bool {
        self.args.by_name(param.name()).is_some()
            || self.args.by_type(param.plugin_type()).is_some()
            || instance.dependency(param.name(), param.plugin_type()).is_some()
    }

    /// Resolves the default `T`
    #[inline]
    pub fn get<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>, Error> {
        let plugin_type = PluginType::of::<T>();
        self.get_default(&plugin_type)
            .and_then(|object| downcast(object, &plugin_type))
    }

    /// Resolves the default `T`, or `None` if it is not configured
    #[inline]
    pub fn try_get<T: Send + Sync + 'static>(&mut self) -> Result<Option<Arc<T>>, Error> {
        optional(self.get::<T>())
    }

    /// Resolves the `T` named `name`
    #[inline]
    pub fn get_named_of<T: Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>, Error> {
        let plugin_type = PluginType::of::<T>();
        self.get_named(&plugin_type, name)
            .and_then(|object| downcast(object, &plugin_type))
    }

    /// Resolves the default `T` and returns a clone of it
    #[inline]
    pub fn resolve<T: Send + Sync + Clone + 'static>(&mut self) -> Result<T, Error> {
        self.get::<T>().map(|t| t.as_ref().clone())
    }
}

/// Turns configuration errors into `None`
#[inline]
pub(crate) fn optional<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_configuration() => Ok(None),
        Err(err) => Err(err),
    }
}

#[inline]
fn describe(registration: &Registration) -> String {
    format!("{} ('{}')", registration.plugin_type(), registration.instance().name())
}

fn check_type(object: &Object, param: &Param) -> Result<Object, Error> {
    match param.plugin_type().type_id() {
        Some(expected) if (**object).type_id() != expected => Err(Error::ArgumentMismatch {
            name: param.name().to_owned(),
            expected: param.plugin_type().clone(),
        }),
        _ => Ok(object.clone()),
    }
}
