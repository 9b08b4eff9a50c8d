//! Statically declared constructors and setters

use crate::{error::Error, instance::Object, plugin_type::PluginType};
use std::{
    any::type_name,
    borrow::Cow,
    cmp::Reverse,
    collections::HashMap,
    fmt::{Debug, Formatter},
    sync::Arc,
};

/// A declared constructor or setter parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: Cow<'static, str>,
    plugin_type: PluginType,
}

impl Param {
    /// Creates a parameter of an arbitrary plugin type
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>, plugin_type: PluginType) -> Self {
        Self { name: name.into(), plugin_type }
    }

    /// Creates a parameter of the Rust type `A`
    #[inline]
    pub fn of<A: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, PluginType::of::<A>())
    }

    /// Parameter name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter type
    #[inline]
    pub fn plugin_type(&self) -> &PluginType {
        &self.plugin_type
    }
}

/// Resolved parameter values handed to a constructor or setter
#[derive(Default)]
pub struct Arguments {
    values: HashMap<String, Object>,
}

impl Debug for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl Arguments {
    #[inline]
    pub(crate) fn insert(&mut self, name: &str, object: Object) {
        self.values.insert(name.to_owned(), object);
    }

    /// Returns the argument `name` as a shared `A`
    pub fn get<A: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<A>, Error> {
        let object = self
            .values
            .get(name)
            .ok_or_else(|| Error::MissingArgument(name.to_owned()))?;
        object
            .clone()
            .downcast::<A>()
            .map_err(|_| Error::ArgumentMismatch {
                name: name.to_owned(),
                expected: PluginType::of::<A>(),
            })
    }

    /// Returns a clone of the argument `name`
    #[inline]
    pub fn value<A: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<A, Error> {
        self.get::<A>(name).map(|a| a.as_ref().clone())
    }

    /// Returns `true` if the argument `name` was resolved
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

type BuildFn<T> = Box<
    dyn Fn(&Arguments) -> Result<T, Error>
    + Send
    + Sync
>;

type ApplyFn<T> = Box<
    dyn Fn(&mut T, &Arguments) -> Result<(), Error>
    + Send
    + Sync
>;

/// One way of building a `T` from declared parameters
///
/// # Example
/// ```
/// use wirebox::instance::Constructor;
///
/// struct Engine { cylinders: u32 }
///
/// let ctor = Constructor::new(|args| Ok(Engine { cylinders: args.value("cylinders")? }))
///     .param::<u32>("cylinders");
///
/// assert_eq!(ctor.params().len(), 1);
/// ```
pub struct Constructor<T> {
    params: Vec<Param>,
    build: BuildFn<T>,
}

impl<T> Debug for Constructor<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

impl<T> Constructor<T> {
    /// Creates a constructor without parameters
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T, Error> + Send + Sync + 'static,
    {
        Self { params: Vec::new(), build: Box::new(build) }
    }

    /// Declares a parameter of the Rust type `A`
    #[inline]
    pub fn param<A: ?Sized + 'static>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with_param(Param::of::<A>(name))
    }

    /// Declares a parameter of an arbitrary plugin type
    #[inline]
    pub fn param_of(self, name: impl Into<Cow<'static, str>>, plugin_type: PluginType) -> Self {
        self.with_param(Param::new(name, plugin_type))
    }

    #[inline]
    fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Declared parameters, in declaration order
    #[inline]
    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

struct Setter<T> {
    param: Param,
    apply: ApplyFn<T>,
}

/// A declarative recipe for a concrete type: its constructors and optional setters.
///
/// Constructors are tried greediest first; see [`Instance::constructed`](crate::Instance::constructed).
/// Setters are only filled when a value is supplied for them explicitly.
pub struct Recipe<T> {
    constructors: Vec<Constructor<T>>,
    setters: Vec<Setter<T>>,
}

impl<T> Default for Recipe<T> {
    #[inline]
    fn default() -> Self {
        Self { constructors: Vec::new(), setters: Vec::new() }
    }
}

impl<T> Debug for Recipe<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recipe")
            .field("type", &type_name::<T>())
            .field("constructors", &self.constructors)
            .field("setters", &self.setters.iter().map(|s| &s.param).collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Send + Sync + 'static> Recipe<T> {
    /// Creates an empty recipe
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds an optional setter of the Rust type `A`
    pub fn setter<A, F>(mut self, name: impl Into<Cow<'static, str>>, apply: F) -> Self
    where
        A: Send + Sync + 'static,
        F: Fn(&mut T, Arc<A>) + Send + Sync + 'static,
    {
        let param = Param::of::<A>(name);
        let name = param.name().to_owned();
        self.setters.push(Setter {
            param,
            apply: Box::new(move |target: &mut T, args: &Arguments| -> Result<(), Error> {
                apply(target, args.get::<A>(&name)?);
                Ok(())
            }),
        });
        self
    }
}

/// Type-erased view of a [`Recipe`]
pub(crate) trait Construct: Send + Sync {
    fn signatures(&self) -> Vec<&[Param]>;

    fn setters(&self) -> Vec<&Param>;

    fn construct(&self, index: usize, args: &Arguments) -> Result<Object, Error>;
}

impl<T: Send + Sync + 'static> Construct for Recipe<T> {
    fn signatures(&self) -> Vec<&[Param]> {
        self.constructors.iter().map(Constructor::params).collect()
    }

    fn setters(&self) -> Vec<&Param> {
        self.setters.iter().map(|s| &s.param).collect()
    }

    fn construct(&self, index: usize, args: &Arguments) -> Result<Object, Error> {
        let constructor = self
            .constructors
            .get(index)
            .ok_or_else(|| Error::Other(format!("no constructor is declared for '{}'", type_name::<T>())))?;
        let mut target = (constructor.build)(args)?;
        for setter in self.setters.iter().filter(|s| args.contains(s.param.name())) {
            (setter.apply)(&mut target, args)?;
        }
        Ok(Arc::new(target))
    }
}

/// Picks the greediest satisfiable constructor, ties broken by declaration order.
///
/// Falls back to the greediest constructor when none can be satisfied, so that
/// building it reports the missing dependency.
pub(crate) fn select_constructor<F>(signatures: &[&[Param]], satisfiable: F) -> Option<usize>
where
    F: Fn(&Param) -> bool,
{
    let mut order = (0..signatures.len()).collect::<Vec<_>>();
    order.sort_by_key(|&i| Reverse(signatures[i].len()));
    order
        .iter()
        .copied()
        .find(|&i| signatures[i].iter().all(&satisfiable))
        .or_else(|| order.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Engine {
        cylinders: u32,
        label: Option<String>,
    }

    fn recipe() -> Recipe<Engine> {
        Recipe::new()
            .constructor(Constructor::new(|_| Ok(Engine::default())))
            .constructor(
                Constructor::new(|args| Ok(Engine { cylinders: args.value("cylinders")?, label: None }))
                    .param::<u32>("cylinders"),
            )
            .setter::<String, _>("label", |engine, label| engine.label = Some(label.as_ref().clone()))
    }

    #[test]
    fn it_selects_the_greediest_satisfiable_constructor() {
        let recipe = recipe();
        let signatures = recipe.signatures();

        assert_eq!(select_constructor(&signatures, |_| true), Some(1));
        assert_eq!(select_constructor(&signatures, |_| false), Some(1));
        assert_eq!(select_constructor(&signatures, |p| p.name() != "cylinders"), Some(0));
    }

    #[test]
    fn it_breaks_ties_by_declaration_order() {
        let first = [Param::of::<u32>("a")];
        let second = [Param::of::<u64>("b")];

        assert_eq!(select_constructor(&[&first[..], &second[..]], |_| true), Some(0));
        assert_eq!(select_constructor(&[&first[..], &second[..]], |p| p.name() == "b"), Some(1));
    }

    #[test]
    fn it_has_no_constructor_to_select_from_an_empty_recipe() {
        assert_eq!(select_constructor(&[], |_| true), None);
    }

    #[test]
    fn it_fills_setters_only_when_supplied() {
        let recipe = recipe();
        let mut args = Arguments::default();
        args.insert("cylinders", Arc::new(8_u32));

        let engine = recipe.construct(1, &args).unwrap().downcast::<Engine>().unwrap();
        assert_eq!(engine.cylinders, 8);
        assert_eq!(engine.label, None);

        args.insert("label", Arc::new(String::from("V8")));

        let engine = recipe.construct(1, &args).unwrap().downcast::<Engine>().unwrap();
        assert_eq!(engine.label.as_deref(), Some("V8"));
    }

    #[test]
    fn it_reports_mismatched_arguments() {
        let mut args = Arguments::default();
        args.insert("cylinders", Arc::new("eight"));

        let err = args.get::<u32>("cylinders").unwrap_err();

        assert!(matches!(err, Error::ArgumentMismatch { ref name, .. } if name == "cylinders"));
        assert!(matches!(args.get::<u32>("missing"), Err(Error::MissingArgument(_))));
    }
}
