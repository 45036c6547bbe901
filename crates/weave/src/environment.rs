use std::path::Path;
use tracing::info;
use weave_bus::Bus;
use weave_domain::Context;
use weave_domain::config::WeaveConfig;
use weave_kernel::config::{ConfigError, load_weave_config};
use weave_viewmodel::{
    ComponentFactory, ComposableViewModel, Registry, Scope, ViewModel, ViewModelError,
    ViewModelParams,
};

/// The collaborators shared by every component of one application scope.
///
/// One bus, the properties, events and view-models registries, a component factory preloaded
/// with `ViewModel` and `ComposableViewModel`, and a root host [`Scope`]. Cloning yields another
/// handle to the same collaborators.
#[derive(Debug, Clone)]
pub struct Environment {
    bus: Bus,
    properties: Registry,
    events: Registry,
    view_models: Registry,
    factory: ComponentFactory,
    scope: Scope,
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_config(&WeaveConfig::default())
    }
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &WeaveConfig) -> Self {
        Self {
            bus: Bus::new(),
            properties: Registry::new(),
            events: Registry::new(),
            view_models: Registry::new(),
            factory: ComponentFactory::with_defaults(),
            scope: Scope::with_config(&config.scope),
        }
    }

    /// Loads and validates a [`WeaveConfig`] (file plus `WEAVE__` overrides) and builds on it.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or holds invalid values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = load_weave_config(Some(path))?;
        info!(path = %path.display(), digest_ttl = config.scope.digest_ttl, "Environment configured");
        Ok(Self::from_config(&config))
    }

    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub const fn properties(&self) -> &Registry {
        &self.properties
    }

    #[must_use]
    pub const fn events(&self) -> &Registry {
        &self.events
    }

    #[must_use]
    pub const fn view_models(&self) -> &Registry {
        &self.view_models
    }

    #[must_use]
    pub const fn factory(&self) -> &ComponentFactory {
        &self.factory
    }

    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Construction parameters for a root component of `context`, hosted on a fresh child scope.
    #[must_use]
    pub fn params(&self, context: impl Into<Context>) -> ViewModelParams {
        ViewModelParams::builder()
            .context(context)
            .host(self.scope.new_child().handle())
            .bus(self.bus.clone())
            .properties_registry(self.properties.clone())
            .events_registry(self.events.clone())
            .view_models_registry(self.view_models.clone())
            .factory(self.factory.clone())
            .build()
    }

    #[must_use]
    pub fn view_model(&self, context: impl Into<Context>) -> ViewModel {
        ViewModel::new(self.params(context))
    }

    #[must_use]
    pub fn composable(&self, context: impl Into<Context>) -> ComposableViewModel {
        ComposableViewModel::new(self.params(context))
    }

    /// Runs one detection cycle over every component of the environment.
    ///
    /// # Errors
    /// Returns [`ViewModelError::DigestOverflow`] when watchers do not settle.
    pub fn digest(&self) -> Result<usize, ViewModelError> {
        self.scope.digest()
    }

    /// Destroys the root scope, and with it every component built from this environment.
    pub fn teardown(&self) {
        self.scope.destroy();
    }
}
