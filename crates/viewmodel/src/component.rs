use crate::properties::PropertyBag;
use serde_json::Value;
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A component instance that can be mounted into a composable view-model.
pub trait Component: Any + Debug + Send + Sync {
    /// The observable state the host watches.
    fn properties(&self) -> &PropertyBag;

    /// Reads a dotted path relative to this component.
    fn resolve(&self, path: &str) -> Option<Value> {
        self.properties().get_path(path)
    }

    /// Releases whatever the component holds. Must tolerate repeated calls.
    fn destroy(&self) {}

    /// Helper to allow downcasting from the trait object.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a built component.
pub type ComponentRef = Arc<dyn Component>;
