//! Container configuration

use crate::lifecycle::Lifecycle;
use std::borrow::Cow;

const DEFAULT_CONTAINER_NAME: &str = "root";

/// Represents a container configuration
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    /// Name of the root container, used in logs
    ///
    /// Default: `root`
    name: Cow<'static, str>,

    /// Lifecycle of instances whose family and instance don't specify one
    ///
    /// Default: [`Lifecycle::PerRequest`]
    default_lifecycle: Lifecycle,

    /// Specifies whether the root container tracks and disposes
    /// transient and per-request disposables
    ///
    /// Default: `false`
    root_transient_tracking: bool,
}

impl Default for ContainerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_CONTAINER_NAME),
            default_lifecycle: Lifecycle::PerRequest,
            root_transient_tracking: false,
        }
    }
}

impl ContainerConfig {
    /// Creates a default container configuration
    ///
    /// Defaults:
    /// - name: `root`
    /// - default_lifecycle: [`Lifecycle::PerRequest`]
    /// - root_transient_tracking: `false`
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the name of the root container
    ///
    /// Default: `root`
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Configures the lifecycle used when neither an instance nor its family specifies one
    ///
    /// Default: [`Lifecycle::PerRequest`]
    pub fn with_default_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.default_lifecycle = lifecycle;
        self
    }

    /// Configures the root container to dispose the transient and per-request
    /// objects it builds when it is disposed.
    ///
    /// Child and nested containers always do; without this the caller owns
    /// whatever the root hands out.
    ///
    /// Default: `false`
    pub fn with_root_transient_tracking(mut self) -> Self {
        self.root_transient_tracking = true;
        self
    }

    /// Name of the root container
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lifecycle used when neither an instance nor its family specifies one
    #[inline]
    pub fn default_lifecycle(&self) -> Lifecycle {
        self.default_lifecycle
    }

    /// Whether the root container tracks transient and per-request disposables
    #[inline]
    pub fn root_transient_tracking(&self) -> bool {
        self.root_transient_tracking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_creates_default_config() {
        let config = ContainerConfig::new();

        assert_eq!(config.name(), "root");
        assert_eq!(config.default_lifecycle(), Lifecycle::PerRequest);
        assert!(!config.root_transient_tracking());
    }

    #[test]
    fn it_configures_every_option() {
        let config = ContainerConfig::new()
            .with_name("app")
            .with_default_lifecycle(Lifecycle::Transient)
            .with_root_transient_tracking();

        assert_eq!(config.name(), "app");
        assert_eq!(config.default_lifecycle(), Lifecycle::Transient);
        assert!(config.root_transient_tracking());
    }
}
