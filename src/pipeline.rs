//! The view of registrations and caches a resolution session works against

use crate::{
    Container,
    dispose::Tracked,
    error::Error,
    instance::Instance,
    lifecycle::{Lifecycle, LifecycleCache},
    plugin_type::PluginType,
};
use std::sync::Arc;

/// An instance selected for a plugin type together with its effective lifecycle
#[derive(Debug, Clone)]
pub struct Registration {
    plugin_type: PluginType,
    instance: Arc<Instance>,
    lifecycle: Lifecycle,
    owner: usize,
}

impl Registration {
    /// Creates a registration owned by the resolving layer itself
    #[inline]
    pub fn new(plugin_type: PluginType, instance: Arc<Instance>, lifecycle: Lifecycle) -> Self {
        Self::owned_by(plugin_type, instance, lifecycle, 0)
    }

    #[inline]
    pub(crate) fn owned_by(plugin_type: PluginType, instance: Arc<Instance>, lifecycle: Lifecycle, owner: usize) -> Self {
        Self { plugin_type, instance, lifecycle, owner }
    }

    /// The requested plugin type
    #[inline]
    pub fn plugin_type(&self) -> &PluginType {
        &self.plugin_type
    }

    /// The selected instance
    #[inline]
    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    /// The effective lifecycle
    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// How many parent hops away from the resolving layer the instance is registered
    #[inline]
    pub(crate) fn owner(&self) -> usize {
        self.owner
    }
}

/// Source of registrations and lifecycle caches for a [`Session`](crate::Session).
///
/// A [`PluginGraph`](crate::PluginGraph) is a pipeline without lifecycle caches;
/// a [`Container`] resolves through its whole parent chain.
pub trait Pipeline {
    /// The default registration for `plugin_type`.
    ///
    /// `Ok(None)` means nothing is registered; several candidates without
    /// a designated default are an [`Error::AmbiguousDefault`].
    fn default_for(&self, plugin_type: &PluginType) -> Result<Option<Registration>, Error>;

    /// The registration named `name`
    fn named(&self, plugin_type: &PluginType, name: &str) -> Result<Option<Registration>, Error>;

    /// Every registration for `plugin_type`, in registration order
    fn all(&self, plugin_type: &PluginType) -> Result<Vec<Registration>, Error>;

    /// Wraps an instance declared inline as a dependency override
    fn inline(&self, plugin_type: &PluginType, instance: Arc<Instance>) -> Registration;

    /// The cache the registration's lifecycle uses
    fn cache_for(&self, registration: &Registration) -> LifecycleCache;

    /// Takes ownership of a disposable object that no cache keeps
    fn track(&self, _tracked: Tracked) {}

    /// The container this pipeline belongs to
    fn container(&self) -> Option<Container> {
        None
    }

    /// Returns `true` if `plugin_type` has an unambiguous default
    fn has_default(&self, plugin_type: &PluginType) -> bool {
        matches!(self.default_for(plugin_type), Ok(Some(_)))
    }
}
