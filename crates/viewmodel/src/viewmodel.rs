use crate::component::Component;
use crate::factory::ComponentFactory;
use crate::host::{Accessor, HostRef};
use crate::properties::PropertyBag;
use crate::registry::{Declaration, Registry};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;
use typed_builder::TypedBuilder;
use weave_bus::Bus;
use weave_domain::{Context, Namespace, Payload, Topic};

/// Everything a component needs to be constructed and to compose children.
///
/// The factory hands one of these to every constructor; children receive a copy of their
/// parent's with their own namespace and a derived host.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ViewModelParams {
    #[builder(setter(into))]
    pub context: Context,
    /// The namespace the component was declared under, verbatim. `None` for roots.
    #[builder(default, setter(strip_option, into))]
    pub namespace: Option<Namespace>,
    pub host: HostRef,
    pub bus: Bus,
    #[builder(default)]
    pub properties_registry: Registry,
    #[builder(default)]
    pub events_registry: Registry,
    #[builder(default)]
    pub view_models_registry: Registry,
    #[builder(default)]
    pub factory: ComponentFactory,
    /// `(context, type name)` of every composable this component is being built under,
    /// outermost first. Empty for roots.
    #[builder(default)]
    pub ancestry: Vec<(Context, Arc<str>)>,
}

impl ViewModelParams {
    /// Parameters for a `type_name` child declared under `namespace`, hosted on a derived host.
    pub(crate) fn for_child(&self, namespace: Namespace, type_name: &Arc<str>) -> Self {
        let mut ancestry = self.ancestry.clone();
        ancestry.push((self.context.clone(), Arc::clone(type_name)));
        Self { namespace: Some(namespace), host: self.host.derive(), ancestry, ..self.clone() }
    }

    /// Whether a `type_name` component is already being built on this context further up.
    pub(crate) fn is_building(&self, type_name: &str) -> bool {
        self.ancestry.iter().any(|(context, ancestor)| {
            *context == self.context && ancestor.as_ref() == type_name
        })
    }
}

/// Lifecycle of a view-model instance. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Lifecycle {
    Constructed = 0,
    Wired = 1,
    /// At least one watch or event fired since wiring.
    Active = 2,
    TornDown = 3,
}

#[derive(Debug)]
pub(crate) struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(Lifecycle::Constructed as u8))
    }

    pub(crate) fn get(&self) -> Lifecycle {
        match self.0.load(Ordering::SeqCst) {
            0 => Lifecycle::Constructed,
            1 => Lifecycle::Wired,
            2 => Lifecycle::Active,
            _ => Lifecycle::TornDown,
        }
    }

    /// Moves to `to` if it lies ahead of the current state.
    pub(crate) fn advance(&self, to: Lifecycle) -> bool {
        let to = to as u8;
        self.0.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| (cur < to).then_some(to)).is_ok()
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.get() == Lifecycle::TornDown
    }
}

/// Installs a watch whose changes are published as property messages on `(context, topic)`.
pub(crate) fn watch_and_publish(
    host: &HostRef,
    bus: &Bus,
    context: &Context,
    topic: Topic,
    accessor: Accessor,
    lifecycle: &Arc<LifecycleCell>,
) {
    let bus = bus.clone();
    let context = context.clone();
    let lifecycle = Arc::clone(lifecycle);

    host.watch(
        accessor,
        Box::new(move |new_value, old_value| {
            if lifecycle.is_torn_down() {
                return;
            }
            lifecycle.advance(Lifecycle::Active);
            bus.publish(
                context.as_str(),
                topic.as_str(),
                Payload::property(new_value.clone(), old_value.clone()),
            );
        }),
    );
}

/// Binds one component's declared properties and events to the bus.
///
/// Wiring happens once, at construction: every plain key the properties registry declares for
/// the context is watched on the host, every declared event is listened to. Dotted keys address
/// composed children and are left to [`crate::ComposableViewModel`].
#[derive(Debug)]
pub struct ViewModel {
    context: Context,
    namespace: Option<Namespace>,
    host: HostRef,
    bus: Bus,
    properties: PropertyBag,
    lifecycle: Arc<LifecycleCell>,
}

impl ViewModel {
    /// A view-model over an empty property bag.
    #[must_use]
    pub fn new(params: ViewModelParams) -> Self {
        Self::with_properties(params, PropertyBag::new())
    }

    /// A view-model over existing component state.
    #[must_use]
    pub fn with_properties(params: ViewModelParams, properties: PropertyBag) -> Self {
        let view_model = Self::wired(&params, properties);
        view_model.lifecycle.advance(Lifecycle::Wired);
        view_model
    }

    /// Builds and wires without declaring the instance ready.
    pub(crate) fn wired(params: &ViewModelParams, properties: PropertyBag) -> Self {
        let view_model = Self {
            context: params.context.clone(),
            namespace: params.namespace.clone(),
            host: Arc::clone(&params.host),
            bus: params.bus.clone(),
            properties,
            lifecycle: Arc::new(LifecycleCell::new()),
        };

        let watched = view_model.wire_properties(&params.properties_registry);
        let listened = view_model.wire_events(&params.events_registry);

        let lifecycle = Arc::clone(&view_model.lifecycle);
        view_model.host.on_destroy(Box::new(move || {
            lifecycle.advance(Lifecycle::TornDown);
        }));
        debug!(context = %view_model.context, watched, listened, "View-model wired");

        view_model
    }

    fn wire_properties(&self, registry: &Registry) -> usize {
        let mut watched = 0;
        for declaration in registry.entries_for(self.context.as_str()) {
            let Declaration::Simple { key } = declaration else { continue };
            if key.is_nested() {
                continue;
            }

            let properties = self.properties.clone();
            let name = key.to_string();
            let accessor: Accessor =
                Box::new(move || properties.get(&name).unwrap_or(Value::Null));
            watch_and_publish(&self.host, &self.bus, &self.context, key, accessor, &self.lifecycle);
            watched += 1;
        }
        watched
    }

    fn wire_events(&self, registry: &Registry) -> usize {
        let mut listened = 0;
        for declaration in registry.entries_for(self.context.as_str()) {
            let Declaration::Simple { key } = declaration else { continue };

            let bus = self.bus.clone();
            let context = self.context.clone();
            let lifecycle = Arc::clone(&self.lifecycle);
            let topic = key.clone();
            self.host.on_event(
                key.as_str(),
                Arc::new(move |data: &Value| {
                    if lifecycle.is_torn_down() {
                        return;
                    }
                    lifecycle.advance(Lifecycle::Active);
                    bus.publish(context.as_str(), topic.as_str(), Payload::event(data.clone()));
                }),
            );
            listened += 1;
        }
        listened
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    #[must_use]
    pub const fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    #[must_use]
    pub const fn host(&self) -> &HostRef {
        &self.host
    }

    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub const fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.properties.get(key)
    }

    /// Writes a property. The change is observed on the host's next detection cycle.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.properties.set(key, value)
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub(crate) const fn lifecycle_cell(&self) -> &Arc<LifecycleCell> {
        &self.lifecycle
    }

    /// Stops publishing for this instance. Idempotent.
    pub fn destroy(&self) {
        if self.lifecycle.advance(Lifecycle::TornDown) {
            debug!(context = %self.context, namespace = ?self.namespace, "View-model torn down");
        }
    }
}

impl Component for ViewModel {
    fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    fn destroy(&self) {
        Self::destroy(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
