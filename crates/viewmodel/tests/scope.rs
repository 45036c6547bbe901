mod fixtures;

use fixtures::{CONTEXT, Harness, spy};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::sync::Arc;
use weave_domain::config::ScopeConfig;
use weave_viewmodel::{HostObservation, Payload, PropertyBag, Scope, ViewModel, ViewModelError};

#[test]
fn test_digest_fails_when_watchers_never_settle() {
    let scope = Scope::with_config(&ScopeConfig { digest_ttl: 3 });
    let bag = PropertyBag::new();
    bag.set("counter", 0);

    let reader = bag.clone();
    let writer = bag.clone();
    scope.watch(
        Box::new(move || reader.get("counter").unwrap_or(Value::Null)),
        Box::new(move |new, _old| {
            writer.set("counter", new.as_i64().unwrap_or_default() + 1);
        }),
    );

    let err = scope.digest().unwrap_err();
    assert!(matches!(err, ViewModelError::DigestOverflow { .. }), "{err}");
    assert_eq!(bag.get("counter"), Some(json!(3)));
}

#[test]
fn test_listener_writes_are_seen_within_the_same_cycle() {
    let scope = Scope::root();
    let bag = PropertyBag::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let reader = bag.clone();
    let sink = Arc::clone(&seen);
    scope.watch(
        Box::new(move || reader.get("derived").unwrap_or(Value::Null)),
        Box::new(move |new, old| sink.lock().push((new.clone(), old.clone()))),
    );
    let source = bag.clone();
    let writer = bag.clone();
    scope.watch(
        Box::new(move || source.get("source").unwrap_or(Value::Null)),
        Box::new(move |new, _old| {
            writer.set("derived", new.clone());
        }),
    );

    bag.set("source", 7);
    let fired = scope.digest().unwrap();

    assert_eq!(fired, 3);
    assert_eq!(*seen.lock(), vec![(Value::Null, Value::Null), (json!(7), Value::Null)]);
}

#[test]
fn test_emit_travels_up_to_ancestors() {
    let h = Harness::new();
    h.events.register(CONTEXT, "testEvent");
    let calls = spy(&h.bus, CONTEXT, "testEvent");
    let _view_model = ViewModel::new(h.params());

    let grandchild = h.scope.new_child().new_child();
    let invoked = grandchild.emit("testEvent", &json!({ "test": 10 }));

    assert_eq!(invoked, 1);
    assert_eq!(*calls.lock(), vec![Payload::event(json!({ "test": 10 }))]);
}

#[test]
fn test_broadcast_travels_down_to_descendants() {
    let h = Harness::new();
    h.events.register(CONTEXT, "testEvent");
    let calls = spy(&h.bus, CONTEXT, "testEvent");

    let child = h.scope.new_child();
    let _view_model = ViewModel::new(
        weave_viewmodel::ViewModelParams { host: child.handle(), ..h.params() },
    );

    assert_eq!(child.parent().map(|p| p.id()), Some(h.scope.id()));
    assert_eq!(h.scope.emit("testEvent", &json!(1)), 0);
    assert_eq!(h.scope.broadcast("testEvent", &json!(2)), 1);
    assert_eq!(*calls.lock(), vec![Payload::event(2)]);
}

#[test]
fn test_destroyed_scope_ignores_cycles_and_events() {
    let h = Harness::new();
    h.properties.register(CONTEXT, "testProperty");
    h.events.register(CONTEXT, "testEvent");
    let properties = spy(&h.bus, CONTEXT, "testProperty");
    let events = spy(&h.bus, CONTEXT, "testEvent");
    let view_model = ViewModel::new(h.params());

    h.scope.destroy();
    view_model.set("testProperty", 1);

    assert_eq!(h.scope.digest().unwrap(), 0);
    assert_eq!(h.scope.emit("testEvent", &json!(1)), 0);
    assert_eq!(h.scope.watcher_count(), 0);
    assert!(properties.lock().is_empty());
    assert!(events.lock().is_empty());
}

#[test]
fn test_destroy_cascades_to_descendants() {
    let root = Scope::root();
    let child = root.new_child();
    let grandchild = child.new_child();

    root.destroy();

    assert!(child.is_destroyed());
    assert!(grandchild.is_destroyed());
    assert!(root.children().is_empty());
}
