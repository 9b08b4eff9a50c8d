//! Build recipes ("instances") registered for plugin types

use crate::{
    Dispose,
    error::Error,
    lifecycle::Lifecycle,
    plugin_type::PluginType,
    session::{FromSession, Session},
};
use std::{
    any::{Any, type_name},
    fmt::{Debug, Display, Formatter},
    sync::{Arc, OnceLock},
};
use uuid::Uuid;

pub use constructor::{Arguments, Constructor, Param, Recipe};
pub use dependency::{Dependency, DependencyKey};
pub use factory::GenericFactory;

use constructor::{Construct, select_constructor};
use dependency::Dependencies;

pub mod constructor;
pub mod dependency;
pub mod factory;

/// A type-erased, shared object built by the container.
///
/// The concrete type behind it is exactly the type the instance builds,
/// so typed access is a plain [`Arc::downcast`].
pub type Object = Arc<
    dyn Any
    + Send
    + Sync
>;

type LambdaFn = Arc<
    dyn Fn(&mut Session<'_>) -> Result<Object, Error>
    + Send
    + Sync
>;

type CastFn = Arc<
    dyn Fn(Object) -> Result<Object, Error>
    + Send
    + Sync
>;

type TemplateFn = Arc<
    dyn Fn(&[PluginType]) -> Option<Instance>
    + Send
    + Sync
>;

type InterceptFn = Arc<
    dyn Fn(Object, &mut Session<'_>) -> Result<Object, Error>
    + Send
    + Sync
>;

type DisposeHook = Arc<
    dyn Fn(&Object) -> Option<Arc<dyn Dispose>>
    + Send
    + Sync
>;

/// Unique identity of an [`Instance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    /// Generates a new random identity
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Display for InstanceId {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

struct Construction {
    recipe: Arc<dyn Construct>,
    selected: OnceLock<usize>,
}

impl Construction {
    #[inline]
    fn new(recipe: Arc<dyn Construct>) -> Self {
        Self { recipe, selected: OnceLock::new() }
    }
}

enum Kind {
    Object(Object),
    Constructed(Construction),
    Lambda(LambdaFn),
    Redirect { target: PluginType, cast: CastFn },
    Generic(TemplateFn),
}

/// An immutable recipe describing how to obtain an object for a plugin type.
///
/// Instances are registered into a [`PluginGraph`](crate::PluginGraph) or a
/// [`ContainerBuilder`](crate::ContainerBuilder) and shared as `Arc<Instance>`
/// from then on.
///
/// # Example
/// ```
/// use wirebox::{Instance, Lifecycle, instance::{Constructor, Recipe}};
///
/// struct Clock;
///
/// let instance = Instance::constructed(Recipe::new().constructor(Constructor::new(|_| Ok(Clock))))
///     .named("system")
///     .with_lifecycle(Lifecycle::Singleton);
///
/// assert_eq!(instance.name(), "system");
/// ```
pub struct Instance {
    id: InstanceId,
    name: String,
    kind: Kind,
    lifecycle: Option<Lifecycle>,
    dependencies: Dependencies,
    interceptors: Vec<InterceptFn>,
    dispose: Option<DisposeHook>,
    description: &'static str,
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("kind", &self.kind_name())
            .field("type", &self.description)
            .field("lifecycle", &self.lifecycle)
            .field("dependencies", &self.dependencies)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}

impl Instance {
    fn new(kind: Kind, description: &'static str) -> Self {
        let id = InstanceId::new();
        Self {
            id,
            name: id.to_string(),
            kind,
            lifecycle: None,
            dependencies: Dependencies::default(),
            interceptors: Vec::new(),
            dispose: None,
            description,
        }
    }

    /// Creates an instance around an already built value
    #[inline]
    pub fn object<T: Send + Sync + 'static>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Creates an instance around an already shared value
    #[inline]
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::new(Kind::Object(value), type_name::<T>())
    }

    /// Creates an instance built from a [`Recipe`].
    ///
    /// On the first build the greediest constructor whose parameters can all be
    /// satisfied is selected; ties go to the one declared first.
    /// If none can be satisfied the greediest one is used, so the build error names
    /// what is missing. The selection is kept for every later build.
    #[inline]
    pub fn constructed<T: Send + Sync + 'static>(recipe: Recipe<T>) -> Self {
        Self::new(Kind::Constructed(Construction::new(Arc::new(recipe))), type_name::<T>())
    }

    /// Creates an instance built by a single [`Constructor`]
    #[inline]
    pub fn constructor<T: Send + Sync + 'static>(constructor: Constructor<T>) -> Self {
        Self::constructed(Recipe::new().constructor(constructor))
    }

    /// Creates an instance built by a function of the resolution session
    pub fn lambda<T, F>(build: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Session<'_>) -> Result<T, Error> + Send + Sync + 'static,
    {
        let build: LambdaFn = Arc::new(move |session: &mut Session<'_>| build(session).map(|t| Arc::new(t) as Object));
        Self::new(Kind::Lambda(build), type_name::<T>())
    }

    /// Creates an instance built by a [`GenericFactory`] whose arguments are
    /// extracted from the session
    pub fn factory<T, F, Args>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromSession,
    {
        Self::lambda(move |session| factory.build(session))
    }

    /// Creates an instance that resolves the default of `target` and casts it.
    ///
    /// Fails with [`Error::CastFailed`] if the target object is not a `U`
    /// or if `cast` returns `None`.
    pub fn redirect<T, U, F>(target: PluginType, cast: F) -> Self
    where
        T: Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: Fn(Arc<U>) -> Option<T> + Send + Sync + 'static,
    {
        let actual = target.to_string();
        let cast: CastFn = Arc::new(move |object: Object| -> Result<Object, Error> {
            let source = object.downcast::<U>().map_err(|_| Error::CastFailed {
                actual: actual.clone(),
                expected: type_name::<U>(),
            })?;
            cast(source)
                .map(|t| Arc::new(t) as Object)
                .ok_or_else(|| Error::CastFailed {
                    actual: type_name::<U>().to_owned(),
                    expected: type_name::<T>(),
                })
        });
        Self::new(Kind::Redirect { target, cast }, type_name::<T>())
    }

    /// Creates an open generic template.
    ///
    /// When a closed plugin type is requested, `template` receives its type
    /// arguments and returns the instance to use for them, if any.
    pub fn open_generic<F>(template: F) -> Self
    where
        F: Fn(&[PluginType]) -> Option<Instance> + Send + Sync + 'static,
    {
        Self::new(Kind::Generic(Arc::new(template)), "open generic template")
    }

    /// Sets the instance name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the lifecycle of the family for this instance
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Overrides how a parameter is satisfied
    pub fn with_dependency(mut self, key: DependencyKey, dependency: Dependency) -> Self {
        self.dependencies.set(key, dependency);
        self
    }

    /// Supplies a literal value for the parameter `name`
    #[inline]
    pub fn with_value<T: Send + Sync + 'static>(self, name: impl Into<String>, value: T) -> Self {
        self.with_dependency(DependencyKey::name(name), Dependency::value(value))
    }

    /// Builds the parameter `name` from an inline instance
    #[inline]
    pub fn with_instance(self, name: impl Into<String>, instance: Instance) -> Self {
        self.with_dependency(DependencyKey::name(name), Dependency::instance(instance))
    }

    /// Pins the parameter `name` to the registered instance `instance_name`
    #[inline]
    pub fn with_named(self, name: impl Into<String>, instance_name: impl Into<String>) -> Self {
        self.with_dependency(DependencyKey::name(name), Dependency::named(instance_name))
    }

    /// Runs `activate` on every object this instance builds, before it is cached
    /// or handed out.
    ///
    /// # Example
    /// ```
    /// use std::sync::atomic::{AtomicBool, Ordering};
    /// use wirebox::{Container, Instance};
    ///
    /// #[derive(Default)]
    /// struct Widget {
    ///     started: AtomicBool,
    /// }
    ///
    /// let instance = Instance::lambda(|_| Ok(Widget::default()))
    ///     .on_creation(|widget: &Widget| {
    ///         widget.started.store(true, Ordering::SeqCst);
    ///         Ok(())
    ///     });
    ///
    /// let widget = Container::new().get_instance::<Widget>(instance).unwrap();
    ///
    /// assert!(widget.started.load(Ordering::SeqCst));
    /// ```
    pub fn on_creation<T, F>(self, activate: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T) -> Result<(), Error> + Send + Sync + 'static,
    {
        let description = self.description;
        self.intercept(move |object: Object, _: &mut Session<'_>| {
            let typed = object.downcast_ref::<T>().ok_or_else(|| Error::CastFailed {
                actual: description.to_owned(),
                expected: type_name::<T>(),
            })?;
            activate(typed)?;
            Ok(object)
        })
    }

    /// Replaces every object this instance builds with the one `decorate` returns.
    ///
    /// Decorators run in the order they were added, after the object is built
    /// and before it is cached. The session lets a decorator resolve what it needs.
    pub fn decorate_with<T, F>(self, decorate: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &mut Session<'_>) -> Result<T, Error> + Send + Sync + 'static,
    {
        let description = self.description;
        self.intercept(move |object: Object, session: &mut Session<'_>| {
            let inner = object.downcast::<T>().map_err(|_| Error::CastFailed {
                actual: description.to_owned(),
                expected: type_name::<T>(),
            })?;
            decorate(inner, session).map(|t| Arc::new(t) as Object)
        })
    }

    fn intercept<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(Object, &mut Session<'_>) -> Result<Object, Error> + Send + Sync + 'static,
    {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Marks the objects of this instance as [`Dispose`]-able `T`s,
    /// so the owning scope disposes them when it ends
    pub fn disposable<T: Dispose + 'static>(mut self) -> Self {
        self.dispose = Some(Arc::new(|object: &Object| {
            object
                .clone()
                .downcast::<T>()
                .ok()
                .map(|t| t as Arc<dyn Dispose>)
        }));
        self
    }

    /// Unique identity
    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Instance name, unique within its family
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instance-level lifecycle, if overridden
    #[inline]
    pub fn lifecycle(&self) -> Option<Lifecycle> {
        self.lifecycle
    }

    /// The Rust type this instance produces
    #[inline]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns `true` if the instance hands out an already built object as is
    #[inline]
    pub fn is_prebuilt(&self) -> bool {
        self.prebuilt().is_some()
    }

    /// Returns `true` for an open generic template
    #[inline]
    pub fn is_open_generic(&self) -> bool {
        matches!(self.kind, Kind::Generic(_))
    }

    #[inline]
    pub(crate) fn prebuilt(&self) -> Option<&Object> {
        match &self.kind {
            Kind::Object(object) if self.interceptors.is_empty() => Some(object),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn dependency(&self, name: &str, plugin_type: &PluginType) -> Option<&Dependency> {
        self.dependencies.find(name, plugin_type)
    }

    /// The disposal handle of an object built by this instance
    #[inline]
    pub(crate) fn disposable_of(&self, object: &Object) -> Option<Arc<dyn Dispose>> {
        self.dispose.as_ref().and_then(|hook| hook(object))
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            Kind::Object(_) => "Object",
            Kind::Constructed(_) => "Constructed",
            Kind::Lambda(_) => "Lambda",
            Kind::Redirect { .. } => "Redirect",
            Kind::Generic(_) => "Generic",
        }
    }

    /// Closes this instance over generic type arguments.
    ///
    /// Templates produce a new instance for the arguments; every other kind is
    /// copied. The closed instance keeps the name, lifecycle and dependency
    /// overrides but gets its own identity.
    pub fn close(&self, args: &[PluginType]) -> Option<Instance> {
        let (kind, description, closed) = match &self.kind {
            Kind::Generic(template) => {
                let closed = template(args)?;
                (
                    closed.kind,
                    closed.description,
                    Some((closed.lifecycle, closed.dependencies, closed.interceptors, closed.dispose)),
                )
            }
            Kind::Object(object) => (Kind::Object(object.clone()), self.description, None),
            Kind::Constructed(c) => (Kind::Constructed(Construction::new(c.recipe.clone())), self.description, None),
            Kind::Lambda(build) => (Kind::Lambda(build.clone()), self.description, None),
            Kind::Redirect { target, cast } => (
                Kind::Redirect { target: target.clone(), cast: cast.clone() },
                self.description,
                None,
            ),
        };

        let mut instance = Instance {
            id: InstanceId::new(),
            name: self.name.clone(),
            kind,
            lifecycle: self.lifecycle,
            dependencies: self.dependencies.clone(),
            interceptors: Vec::new(),
            dispose: self.dispose.clone(),
            description,
        };
        if let Some((lifecycle, dependencies, interceptors, dispose)) = closed {
            instance.lifecycle = lifecycle.or(instance.lifecycle);
            instance.dependencies.extend(dependencies);
            instance.interceptors = interceptors;
            instance.dispose = dispose.or(instance.dispose);
        }
        instance.interceptors.extend(self.interceptors.iter().cloned());
        Some(instance)
    }

    /// Builds a new object through the session and runs the interceptors on it
    pub(crate) fn build(&self, plugin_type: &PluginType, session: &mut Session<'_>) -> Result<Object, Error> {
        let object = self.build_object(plugin_type, session)?;
        self.interceptors
            .iter()
            .try_fold(object, |object, intercept| intercept(object, session))
    }

    fn build_object(&self, plugin_type: &PluginType, session: &mut Session<'_>) -> Result<Object, Error> {
        match &self.kind {
            Kind::Object(object) => Ok(object.clone()),
            Kind::Lambda(build) => build(session),
            Kind::Redirect { target, cast } => cast(session.get_default(target)?),
            Kind::Generic(_) => Err(Error::OpenGeneric(plugin_type.clone())),
            Kind::Constructed(construction) => self.construct(construction, session),
        }
    }

    fn construct(&self, construction: &Construction, session: &mut Session<'_>) -> Result<Object, Error> {
        let recipe = &construction.recipe;
        let signatures = recipe.signatures();
        let index = *construction.selected.get_or_init(|| {
            select_constructor(&signatures, |param| session.can_satisfy(self, param)).unwrap_or_default()
        });

        let mut args = Arguments::default();
        if let Some(params) = signatures.get(index) {
            for param in params.iter() {
                let object = session.resolve_parameter(self, param)?;
                args.insert(param.name(), object);
            }
        }
        for param in recipe.setters() {
            if session.is_overridden(self, param) {
                let object = session.resolve_parameter(self, param)?;
                args.insert(param.name(), object);
            }
        }
        recipe.construct(index, &args)
    }
}

/// Casts a built object to `T`
pub(crate) fn downcast<T: Send + Sync + 'static>(object: Object, built_for: &PluginType) -> Result<Arc<T>, Error> {
    object.downcast::<T>().map_err(|_| Error::CastFailed {
        actual: built_for.to_string(),
        expected: type_name::<T>(),
    })
}
