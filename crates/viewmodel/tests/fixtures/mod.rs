#![allow(dead_code, unreachable_pub)]

use parking_lot::Mutex;
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use weave_viewmodel::{
    Bus, Component, ComponentFactory, Context, Namespace, Payload, PropertyBag, Registry, Scope,
    ViewModel, ViewModelParams,
};

pub const CONTEXT: &str = "SampleContext";

pub type Calls = Arc<Mutex<Vec<Payload>>>;

/// Subscribes a recording spy to `(context, topic)`.
pub fn spy(bus: &Bus, context: &str, topic: &str) -> Calls {
    let calls = Calls::default();
    let sink = Arc::clone(&calls);
    bus.subscribe(context, topic, move |payload: &Payload| sink.lock().push(payload.clone()));
    calls
}

/// A toolbar child component with an `order` and a nested `complexProperty`.
#[derive(Debug)]
pub struct ToolbarViewModel {
    pub view_model: ViewModel,
    pub context: Context,
    pub namespace: Option<Namespace>,
    pub destroyed: Arc<AtomicUsize>,
}

impl ToolbarViewModel {
    pub fn new(params: ViewModelParams, destroyed: Arc<AtomicUsize>) -> Self {
        let context = params.context.clone();
        let namespace = params.namespace.clone();
        let properties = PropertyBag::from_value(json!({
            "order": "asc",
            "complexProperty": { "a": { "b": "foo" } },
        }));
        Self { view_model: ViewModel::with_properties(params, properties), context, namespace, destroyed }
    }

    pub fn destroy_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl Component for ToolbarViewModel {
    fn properties(&self) -> &PropertyBag {
        self.view_model.properties()
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        self.view_model.destroy();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Everything one test needs: a root scope, a bus, the three registries and a factory.
#[derive(Debug)]
pub struct Harness {
    pub scope: Scope,
    pub bus: Bus,
    pub properties: Registry,
    pub events: Registry,
    pub view_models: Registry,
    pub factory: ComponentFactory,
    pub toolbar_destroyed: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new() -> Self {
        let factory = ComponentFactory::with_defaults();
        let toolbar_destroyed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&toolbar_destroyed);
        factory.register_component("ToolbarViewModel", move |params| {
            ToolbarViewModel::new(params, Arc::clone(&counter))
        });

        Self {
            scope: Scope::root(),
            bus: Bus::new(),
            properties: Registry::new(),
            events: Registry::new(),
            view_models: Registry::new(),
            factory,
            toolbar_destroyed,
        }
    }

    pub fn params(&self) -> ViewModelParams {
        self.params_for(CONTEXT)
    }

    pub fn params_for(&self, context: &str) -> ViewModelParams {
        ViewModelParams::builder()
            .context(context)
            .host(self.scope.handle())
            .bus(self.bus.clone())
            .properties_registry(self.properties.clone())
            .events_registry(self.events.clone())
            .view_models_registry(self.view_models.clone())
            .factory(self.factory.clone())
            .build()
    }

    pub fn toolbar_destroy_count(&self) -> usize {
        self.toolbar_destroyed.load(Ordering::SeqCst)
    }
}
