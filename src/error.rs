//! Describes dependency injection errors

use crate::{dispose::DisposeFailure, instance::InstanceId, plugin_type::PluginType};
use std::fmt::{Display, Formatter};

/// A boxed error returned by user factories and [`Dispose`](crate::Dispose) implementations
pub type BoxError = Box<
    dyn std::error::Error
    + Send
    + Sync
>;

/// Dependency injection errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A session was asked for its container but was created without one
    #[error("Services Error: DI container is missing")]
    ContainerMissing,

    /// The container has been disposed and no longer resolves services
    #[error("Services Error: the container has been disposed")]
    ContainerDisposed,

    /// No default instance is registered and none can be determined
    #[error("Services Error: no default instance is registered and cannot be automatically determined for type '{0}'")]
    NotRegistered(PluginType),

    /// More than one instance is registered and none of them is the designated default
    #[error("Services Error: no default instance is specified for type '{plugin_type}', registered instances: {}", .instances.join(", "))]
    AmbiguousDefault {
        /// The requested plugin type
        plugin_type: PluginType,
        /// Names of the registered instances
        instances: Vec<String>,
    },

    /// A named instance was requested that is not registered
    #[error("Services Error: could not find an instance named '{name}' for type '{plugin_type}'")]
    NamedInstanceNotFound {
        /// The requested plugin type
        plugin_type: PluginType,
        /// The requested instance name
        name: String,
    },

    /// Singletons cannot be registered into a nested container
    #[error("Services Error: singleton lifecycle is not allowed in a nested container for type '{0}'")]
    SingletonInNestedContainer(PluginType),

    /// An open generic plugin type was closed over a wrong number of type arguments
    #[error("Services Error: '{plugin_type}' expects {expected} type argument(s), got {actual}")]
    ArityMismatch {
        /// The open generic plugin type
        plugin_type: PluginType,
        /// Declared number of type arguments
        expected: usize,
        /// Supplied number of type arguments
        actual: usize,
    },

    /// An open generic plugin type can only be resolved through one of its closed types
    #[error("Services Error: open generic type '{0}' cannot be built without type arguments")]
    OpenGeneric(PluginType),

    /// An instance depends on itself, directly or transitively
    #[error("Services Error: bi-directional dependency detected: {0}")]
    BidirectionalDependency(BuildPath),

    /// A supplied argument does not have the declared type
    #[error("Services Error: argument '{name}' does not match the expected type '{expected}'")]
    ArgumentMismatch {
        /// Parameter name
        name: String,
        /// Declared parameter type
        expected: PluginType,
    },

    /// A constructor asked for an argument it did not declare
    #[error("Services Error: missing argument '{0}'")]
    MissingArgument(String),

    /// A built object could not be cast to the requested type
    #[error("Services Error: unable to cast the object built for '{actual}' to '{expected}'")]
    CastFailed {
        /// Description of what was built
        actual: String,
        /// The requested Rust type
        expected: &'static str,
    },

    /// An error raised by user code while building an object
    #[error("Services Error: {0}")]
    Factory(#[source] BoxError),

    /// A plain error message
    #[error("{0}")]
    Other(String),

    /// Building an instance failed; `path` lists every frame up to the failing one
    #[error("Services Error: failure while building {path}: {source}")]
    Build {
        /// The resolution path at the point of failure
        path: BuildPath,
        /// Root cause
        #[source]
        source: Box<Error>,
    },

    /// One or more objects failed to dispose; every object was still attempted
    #[error("Services Error: {} object(s) failed to dispose: {}", .0.len(), DisposeFailures(.0))]
    Disposal(Vec<DisposeFailure>),
}

impl Error {
    /// Creates an [`Error::Factory`] from any error
    #[inline]
    pub fn factory(err: impl Into<BoxError>) -> Self {
        Error::Factory(err.into())
    }

    /// Returns `true` for missing or ambiguous configuration.
    ///
    /// These are the errors the `try_*` resolution methods turn into `None`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NotRegistered(_)
                | Error::AmbiguousDefault { .. }
                | Error::NamedInstanceNotFound { .. }
        )
    }

    /// Returns the innermost cause, unwrapping [`Error::Build`] layers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Build { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns the resolution path for build failures
    pub fn path(&self) -> Option<&BuildPath> {
        match self {
            Error::Build { path, .. } | Error::BidirectionalDependency(path) => Some(path),
            _ => None,
        }
    }
}

/// One step of a resolution: the plugin type and the instance building it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFrame {
    plugin_type: PluginType,
    instance: InstanceId,
    name: String,
}

impl BuildFrame {
    pub(crate) fn new(plugin_type: PluginType, instance: InstanceId, name: &str) -> Self {
        Self { plugin_type, instance, name: name.to_owned() }
    }

    /// The plugin type being resolved
    #[inline]
    pub fn plugin_type(&self) -> &PluginType {
        &self.plugin_type
    }

    /// The name of the instance being built
    #[inline]
    pub fn instance_name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn is_same(&self, other: &BuildFrame) -> bool {
        self.instance == other.instance && self.plugin_type == other.plugin_type
    }
}

impl Display for BuildFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' ('{}')", self.plugin_type, self.name)
    }
}

/// The chain of frames from the top-level request down to the failing build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPath(Vec<BuildFrame>);

impl BuildPath {
    pub(crate) fn new(frames: Vec<BuildFrame>) -> Self {
        Self(frames)
    }

    /// Frames from the outermost request to the innermost build
    #[inline]
    pub fn frames(&self) -> &[BuildFrame] {
        &self.0
    }

    /// Number of frames
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the path has no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for BuildPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, frame) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            Display::fmt(frame, f)?;
        }
        Ok(())
    }
}

struct DisposeFailures<'a>(&'a [DisposeFailure]);

impl Display for DisposeFailures<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            Display::fmt(failure, f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_unwraps_root_cause() {
        let inner = Error::NotRegistered(PluginType::named("IFoo"));
        let err = Error::Build {
            path: BuildPath::default(),
            source: Box::new(Error::Build { path: BuildPath::default(), source: Box::new(inner) }),
        };

        assert!(matches!(err.root_cause(), Error::NotRegistered(_)));
    }

    #[test]
    fn it_classifies_configuration_errors() {
        assert!(Error::NotRegistered(PluginType::named("IFoo")).is_configuration());
        assert!(!Error::ContainerDisposed.is_configuration());
        assert!(!Error::Other("boom".into()).is_configuration());
    }

    #[test]
    fn it_formats_not_registered() {
        let err = Error::NotRegistered(PluginType::named("IWidget"));

        assert_eq!(
            err.to_string(),
            "Services Error: no default instance is registered and cannot be automatically determined for type 'IWidget'"
        );
    }

    #[test]
    fn it_formats_ambiguous_default_with_instance_names() {
        let err = Error::AmbiguousDefault {
            plugin_type: PluginType::named("IWidget"),
            instances: vec!["Purple".into(), "DarkGreen".into()],
        };

        assert!(err.to_string().ends_with("registered instances: Purple, DarkGreen"));
    }
}
