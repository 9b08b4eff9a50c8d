//! Type-identity keys for services

use crate::error::Error;
use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    fmt::{Debug, Display, Formatter},
    sync::Arc,
};

/// Identifies a service ("plugin") type that instances can be registered for.
///
/// A key is one of:
/// - a Rust type, see [`PluginType::of`];
/// - an abstract name, see [`PluginType::named`];
/// - an open generic definition and its closed instantiations,
///   see [`PluginType::open`] and [`PluginType::close`].
///
/// An open generic key and each of its closed keys are distinct.
///
/// # Example
/// ```
/// use wirebox::PluginType;
///
/// let open = PluginType::open("IService", 1);
/// let closed = open.close([PluginType::of::<String>()]).unwrap();
///
/// assert!(open.is_open());
/// assert_eq!(closed.generic_definition(), Some(open));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PluginType(Arc<Key>);

#[derive(PartialEq, Eq, Hash)]
struct Key {
    name: Cow<'static, str>,
    type_id: Option<TypeId>,
    arity: usize,
    args: Vec<PluginType>,
}

impl PluginType {
    /// Creates a key for the Rust type `T`
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::new(Key {
            name: Cow::Borrowed(type_name::<T>()),
            type_id: Some(TypeId::of::<T>()),
            arity: 0,
            args: Vec::new(),
        }))
    }

    /// Creates an abstract key identified only by its name
    #[inline]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::generic(name.into(), 0, Vec::new())
    }

    /// Creates an open generic key with `arity` type parameters
    #[inline]
    pub fn open(name: impl Into<Cow<'static, str>>, arity: usize) -> Self {
        Self::generic(name.into(), arity, Vec::new())
    }

    /// Closes an open generic key over the given type arguments
    pub fn close<I>(&self, args: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = PluginType>,
    {
        let args = args.into_iter().collect::<Vec<_>>();
        if !self.is_open() || args.len() != self.0.arity {
            return Err(Error::ArityMismatch {
                plugin_type: self.clone(),
                expected: if self.is_open() { self.0.arity } else { 0 },
                actual: args.len(),
            });
        }
        Ok(Self::generic(self.0.name.clone(), self.0.arity, args))
    }

    #[inline]
    fn generic(name: Cow<'static, str>, arity: usize, args: Vec<PluginType>) -> Self {
        Self(Arc::new(Key { name, type_id: None, arity, args }))
    }

    /// The type name, without type arguments
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The [`TypeId`] of the Rust type this key was created from, if any
    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.0.type_id
    }

    /// Returns `true` if this key was created from the Rust type `T`
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.0.type_id == Some(TypeId::of::<T>())
    }

    /// Returns `true` for an open generic definition
    #[inline]
    pub fn is_open(&self) -> bool {
        self.0.arity > 0 && self.0.args.is_empty()
    }

    /// Returns `true` for a closed generic instantiation
    #[inline]
    pub fn is_closed_generic(&self) -> bool {
        !self.0.args.is_empty()
    }

    /// Type arguments of a closed generic key
    #[inline]
    pub fn type_arguments(&self) -> &[PluginType] {
        &self.0.args
    }

    /// For a closed generic key, returns its open definition
    pub fn generic_definition(&self) -> Option<PluginType> {
        self.is_closed_generic()
            .then(|| Self::generic(self.0.name.clone(), self.0.arity, Vec::new()))
    }
}

impl Display for PluginType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.name)?;
        if self.is_open() {
            f.write_str("<")?;
            for _ in 1..self.0.arity {
                f.write_str(",")?;
            }
            return f.write_str(">");
        }
        if self.is_closed_generic() {
            f.write_str("<")?;
            for (i, arg) in self.0.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                Display::fmt(arg, f)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl Debug for PluginType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "PluginType({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Widget {}

    #[test]
    fn it_identifies_rust_types() {
        assert_eq!(PluginType::of::<String>(), PluginType::of::<String>());
        assert_ne!(PluginType::of::<String>(), PluginType::of::<u32>());
        assert!(PluginType::of::<dyn Widget>().is::<dyn Widget>());
    }

    #[test]
    fn it_distinguishes_open_and_closed_keys() {
        let open = PluginType::open("IService", 1);
        let closed = open.close([PluginType::of::<String>()]).unwrap();
        let other = open.close([PluginType::of::<u32>()]).unwrap();

        assert_ne!(open, closed);
        assert_ne!(closed, other);
        assert_eq!(closed, open.close([PluginType::of::<String>()]).unwrap());
        assert_eq!(closed.generic_definition(), Some(open.clone()));
        assert_eq!(open.generic_definition(), None);
    }

    #[test]
    fn it_rejects_wrong_arity() {
        let open = PluginType::open("IMap", 2);

        let err = open.close([PluginType::of::<String>()]).unwrap_err();

        assert!(matches!(err, Error::ArityMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn it_rejects_closing_a_non_generic_key() {
        let err = PluginType::named("IWidget").close([PluginType::of::<String>()]);

        assert!(err.is_err());
    }

    #[test]
    fn it_displays_generic_keys() {
        let open = PluginType::open("IMap", 2);
        let closed = open
            .close([PluginType::named("Key"), PluginType::named("Value")])
            .unwrap();

        assert_eq!(open.to_string(), "IMap<,>");
        assert_eq!(closed.to_string(), "IMap<Key, Value>");
        assert_eq!(PluginType::named("IWidget").to_string(), "IWidget");
    }
}
