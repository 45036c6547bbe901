use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Reads the current value of a watched expression.
pub type Accessor = Box<dyn Fn() -> Value + Send + Sync>;

/// Called with `(new_value, old_value)` when a watched value differs from its last snapshot.
pub type ChangeListener = Box<dyn Fn(&Value, &Value) + Send + Sync>;

/// Called with the payload of an emitted event.
pub type EventListener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Runs once when the owning scope is torn down.
pub type TeardownHook = Box<dyn FnOnce() + Send>;

/// Shared handle to a host observation capability.
pub type HostRef = Arc<dyn HostObservation>;

/// Change-detection and event primitives supplied by the host view layer.
///
/// Contract for [`HostObservation::watch`]: the first time a fresh watch is evaluated it reports
/// the current value as both new and old; afterwards it fires only when the value differs
/// structurally from the previous snapshot, with the true previous value as old.
pub trait HostObservation: Debug + Send + Sync {
    fn watch(&self, accessor: Accessor, on_change: ChangeListener);

    fn on_event(&self, name: &str, listener: EventListener);

    /// Registers a hook fired once when this host is destroyed.
    fn on_destroy(&self, hook: TeardownHook);

    /// A host for a child component, torn down together with this one.
    fn derive(&self) -> HostRef;

    /// Tears this host down ahead of its parent, e.g. a derived host whose component was never
    /// mounted. Must tolerate repeated calls.
    fn destroy(&self);
}
