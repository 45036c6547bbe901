use crate::component::{Component, ComponentRef};
use crate::host::{Accessor, HostRef};
use crate::properties::PropertyBag;
use crate::registry::Declaration;
use crate::viewmodel::{Lifecycle, LifecycleCell, ViewModel, ViewModelParams, watch_and_publish};
use serde_json::Value;
use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use weave_domain::{MountKey, Namespace};

/// Composables nested deeper than this are not built, whatever their contexts.
const MAX_COMPOSITION_DEPTH: usize = 32;

/// A child component mounted under its normalized namespace.
#[derive(Debug, Clone)]
pub struct MountedChild {
    key: MountKey,
    namespace: Namespace,
    type_name: Arc<str>,
    component: ComponentRef,
    host: HostRef,
}

impl MountedChild {
    #[must_use]
    pub const fn key(&self) -> &MountKey {
        &self.key
    }

    /// The namespace as declared, before normalization.
    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub const fn component(&self) -> &ComponentRef {
        &self.component
    }
}

#[derive(Debug)]
struct Composition {
    children: Vec<MountedChild>,
    torn_down: AtomicBool,
    lifecycle: Arc<LifecycleCell>,
}

impl Composition {
    fn child(&self, key: &str) -> Option<&MountedChild> {
        self.children.iter().find(|child| child.key.as_str() == key)
    }

    fn tear_down(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lifecycle.advance(Lifecycle::TornDown);

        debug!(children = self.children.len(), "Tearing down composition");
        for child in &self.children {
            child.component.destroy();
        }
    }
}

/// A view-model that also builds, mounts and forwards its declared children.
///
/// Construction runs the plain [`ViewModel`] wiring first, then for every component declaration
/// of the context builds a child through the factory (same context, derived host) and mounts it
/// under the namespace's mount key. Dotted property keys such as `toolbar.order` are watched on
/// the mounted child and republished on the parent's context under the full dotted topic.
/// Destroying the host scope, or calling [`ComposableViewModel::destroy`], destroys every mounted
/// child exactly once.
///
/// A declaration whose type is already being composed on the same context further up is skipped,
/// as are unknown types. Children that fail to build leave no derived scope behind.
#[derive(Debug)]
pub struct ComposableViewModel {
    view_model: ViewModel,
    composition: Arc<Composition>,
}

impl ComposableViewModel {
    #[must_use]
    pub fn new(params: ViewModelParams) -> Self {
        Self::with_properties(params, PropertyBag::new())
    }

    #[must_use]
    pub fn with_properties(params: ViewModelParams, properties: PropertyBag) -> Self {
        let view_model = ViewModel::wired(&params, properties);
        let composition = Arc::new(Composition {
            children: Self::compose(&params),
            torn_down: AtomicBool::new(false),
            lifecycle: Arc::clone(view_model.lifecycle_cell()),
        });

        let composable = Self { view_model, composition };
        let forwarded = composable.wire_nested(&params);

        let composition = Arc::clone(&composable.composition);
        params.host.on_destroy(Box::new(move || composition.tear_down()));

        composable.view_model.lifecycle_cell().advance(Lifecycle::Wired);
        debug!(
            context = %params.context,
            children = composable.composition.children.len(),
            forwarded,
            "Composable view-model wired"
        );
        composable
    }

    fn compose(params: &ViewModelParams) -> Vec<MountedChild> {
        let mut children: Vec<MountedChild> = Vec::new();

        for declaration in params.view_models_registry.entries_for(params.context.as_str()) {
            let Declaration::Component { namespace, type_name } = declaration else { continue };

            if params.ancestry.len() >= MAX_COMPOSITION_DEPTH || params.is_building(&type_name) {
                warn!(
                    context = %params.context,
                    %namespace,
                    %type_name,
                    depth = params.ancestry.len(),
                    "Child component would compose itself, skipped"
                );
                continue;
            }
            if !params.factory.contains(&type_name) {
                warn!(
                    context = %params.context,
                    %namespace,
                    %type_name,
                    "Unknown component type, child skipped"
                );
                continue;
            }

            let child_params = params.for_child(namespace.clone(), &type_name);
            let host = Arc::clone(&child_params.host);
            let component = match params.factory.build(&type_name, child_params) {
                Ok(component) => component,
                Err(error) => {
                    host.destroy();
                    warn!(
                        context = %params.context,
                        %namespace,
                        %type_name,
                        %error,
                        "Child component skipped"
                    );
                    continue;
                },
            };

            let child =
                MountedChild { key: namespace.mount_key(), namespace, type_name, component, host };
            if let Some(slot) = children.iter_mut().find(|mounted| mounted.key == child.key) {
                warn!(
                    context = %params.context,
                    key = %child.key,
                    replaced = %slot.namespace,
                    "Mount key declared twice, replacing earlier child"
                );
                let displaced = std::mem::replace(slot, child);
                displaced.component.destroy();
                displaced.host.destroy();
            } else {
                children.push(child);
            }
        }
        children
    }

    /// Watches every dotted property key on the mounted child it addresses.
    fn wire_nested(&self, params: &ViewModelParams) -> usize {
        let mut forwarded = 0;

        for declaration in params.properties_registry.entries_for(params.context.as_str()) {
            let Declaration::Simple { key } = declaration else { continue };
            let Some((mount_key, path)) = key.split_nested() else { continue };

            let Some(child) = self.composition.child(mount_key) else {
                warn!(context = %params.context, %key, "Nested property skipped, nothing mounted");
                continue;
            };
            if child.component.resolve(path).is_none() {
                warn!(context = %params.context, %key, "Nested property skipped, path not found");
                continue;
            }

            let component = Arc::clone(&child.component);
            let path = path.to_owned();
            let accessor: Accessor =
                Box::new(move || component.resolve(&path).unwrap_or(Value::Null));
            watch_and_publish(
                &params.host,
                &params.bus,
                &params.context,
                key,
                accessor,
                self.view_model.lifecycle_cell(),
            );
            forwarded += 1;
        }

        forwarded
    }

    /// The child mounted under `key`.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&ComponentRef> {
        self.composition.child(key).map(MountedChild::component)
    }

    /// The child mounted under `key`, downcast to its concrete type.
    #[must_use]
    pub fn child_as<T: Component>(&self, key: &str) -> Option<&T> {
        self.child(key)?.as_any().downcast_ref::<T>()
    }

    /// Mounted children in mount order.
    #[must_use]
    pub fn children(&self) -> &[MountedChild] {
        &self.composition.children
    }

    #[must_use]
    pub const fn view_model(&self) -> &ViewModel {
        &self.view_model
    }

    /// Destroys every mounted child once and stops publishing. Idempotent.
    pub fn destroy(&self) {
        self.composition.tear_down();
    }
}

impl Deref for ComposableViewModel {
    type Target = ViewModel;

    fn deref(&self) -> &Self::Target {
        &self.view_model
    }
}

impl Component for ComposableViewModel {
    fn properties(&self) -> &PropertyBag {
        self.view_model.properties()
    }

    fn resolve(&self, path: &str) -> Option<Value> {
        if let Some((head, rest)) = path.split_once('.')
            && let Some(child) = self.composition.child(head)
        {
            return child.component.resolve(rest);
        }
        self.view_model.properties().get_path(path)
    }

    fn destroy(&self) {
        Self::destroy(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
