use crate::component::{Component, ComponentRef};
use crate::composable::ComposableViewModel;
use crate::error::ViewModelError;
use crate::viewmodel::{ViewModel, ViewModelParams};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Something that can build a component from a parameter bag.
///
/// Implemented for every `Fn(ViewModelParams) -> Result<ComponentRef, ViewModelError>`.
pub trait Buildable: Send + Sync {
    /// # Errors
    /// Returns [`ViewModelError`] when the component cannot be produced.
    fn construct(&self, params: ViewModelParams) -> Result<ComponentRef, ViewModelError>;
}

impl<F> Buildable for F
where
    F: Fn(ViewModelParams) -> Result<ComponentRef, ViewModelError> + Send + Sync,
{
    fn construct(&self, params: ViewModelParams) -> Result<ComponentRef, ViewModelError> {
        self(params)
    }
}

/// Name → constructor mapping supplied by the embedding application.
///
/// Cloning yields another handle to the same mapping, so constructors registered after a
/// factory was handed to components are still visible to them.
#[derive(Clone, Default)]
pub struct ComponentFactory {
    constructors: Arc<RwLock<FxHashMap<String, Arc<dyn Buildable>>>>,
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.type_names();
        names.sort_unstable();
        f.debug_struct("ComponentFactory").field("types", &names).finish()
    }
}

impl ComponentFactory {
    /// An empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory that already knows `ViewModel` and `ComposableViewModel`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let factory = Self::new();
        factory
            .register_component("ViewModel", ViewModel::new)
            .register_component("ComposableViewModel", ComposableViewModel::new);
        factory
    }

    /// Registers `constructor` under `type_name`, replacing any previous one.
    pub fn register(
        &self,
        type_name: impl Into<String>,
        constructor: impl Buildable + 'static,
    ) -> &Self {
        let type_name = type_name.into();
        trace!(%type_name, "Constructor registered");
        self.constructors.write().insert(type_name, Arc::new(constructor));
        self
    }

    /// Registers an infallible constructor returning a concrete component.
    pub fn register_component<C, F>(&self, type_name: impl Into<String>, constructor: F) -> &Self
    where
        C: Component,
        F: Fn(ViewModelParams) -> C + Send + Sync + 'static,
    {
        self.register(
            type_name,
            move |params: ViewModelParams| -> Result<ComponentRef, ViewModelError> {
                let component: ComponentRef = Arc::new(constructor(params));
                Ok(component)
            },
        )
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.read().contains_key(type_name)
    }

    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        self.constructors.read().keys().cloned().collect()
    }

    /// Builds the component registered under `type_name`.
    ///
    /// # Errors
    /// Returns [`ViewModelError::UnknownComponent`] when nothing is registered under that name,
    /// or whatever the constructor returns.
    pub fn build(
        &self,
        type_name: &str,
        params: ViewModelParams,
    ) -> Result<ComponentRef, ViewModelError> {
        let constructor = self.constructors.read().get(type_name).cloned().ok_or_else(|| {
            ViewModelError::UnknownComponent {
                type_name: type_name.to_owned().into(),
                context: Some(format!("context {}", params.context).into()),
            }
        })?;

        debug!(type_name, context = %params.context, "Building component");
        constructor.construct(params)
    }
}
