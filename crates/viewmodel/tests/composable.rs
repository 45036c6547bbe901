mod fixtures;

use fixtures::{CONTEXT, Harness, ToolbarViewModel, spy};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use weave_viewmodel::{
    Component, ComponentRef, ComposableViewModel, Lifecycle, Payload, ViewModelError,
    ViewModelParams,
};

fn toolbar(composable: &ComposableViewModel) -> &ToolbarViewModel {
    composable.child_as::<ToolbarViewModel>("toolbar").expect("toolbar is mounted")
}

#[test]
fn test_declared_child_is_mounted() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());

    assert_eq!(toolbar(&composable).view_model.get("order"), Some(json!("asc")));
    assert_eq!(composable.resolve("toolbar.order"), Some(json!("asc")));
    assert_eq!(composable.lifecycle(), Lifecycle::Wired);
}

#[test]
fn test_child_receives_parent_context_and_declared_namespace() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());
    let child = toolbar(&composable);

    assert_eq!(child.context.as_str(), CONTEXT);
    assert_eq!(child.namespace.as_ref().map(|ns| ns.as_str()), Some("Toolbar"));

    let mounted = &composable.children()[0];
    assert_eq!(mounted.key().as_str(), "toolbar");
    assert_eq!(mounted.namespace().as_str(), "Toolbar");
    assert_eq!(mounted.type_name(), "ToolbarViewModel");
}

#[test]
fn test_nested_property_is_forwarded_on_parent_context() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");
    h.properties.register(CONTEXT, "toolbar.order");
    let calls = spy(&h.bus, CONTEXT, "toolbar.order");
    let child_topic = spy(&h.bus, CONTEXT, "order");

    let composable = ComposableViewModel::new(h.params());

    toolbar(&composable).view_model.set("order", "desc");
    h.scope.digest().unwrap();
    assert_eq!(*calls.lock(), vec![Payload::property("desc", "desc")]);

    toolbar(&composable).view_model.set("order", "asc");
    h.scope.digest().unwrap();
    assert_eq!(
        *calls.lock(),
        vec![Payload::property("desc", "desc"), Payload::property("asc", "desc")]
    );
    assert!(child_topic.lock().is_empty());
}

#[test]
fn test_nested_complex_property_is_compared_structurally() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");
    h.properties.register(CONTEXT, "toolbar.complexProperty");
    let calls = spy(&h.bus, CONTEXT, "toolbar.complexProperty");

    let composable = ComposableViewModel::new(h.params());
    h.scope.digest().unwrap();
    toolbar(&composable).view_model.properties().set_path("complexProperty.a.b", "bar");
    h.scope.digest().unwrap();

    let foo = json!({ "a": { "b": "foo" } });
    let bar = json!({ "a": { "b": "bar" } });
    assert_eq!(
        *calls.lock(),
        vec![Payload::property(foo.clone(), foo.clone()), Payload::property(bar, foo)]
    );
}

#[test]
fn test_namespaces_are_normalized_to_mount_keys() {
    for (namespace, expected) in
        [("Toolbar", "toolbar"), ("toolbar", "toolbar"), ("toolbarManagement", "toolbarManagement")]
    {
        let h = Harness::new();
        h.view_models.register_component(CONTEXT, namespace, "ToolbarViewModel");

        let composable = ComposableViewModel::new(h.params());

        assert!(composable.child(expected).is_some(), "{namespace} should mount at {expected}");
        assert_eq!(composable.children().len(), 1);
    }
}

#[test]
fn test_duplicate_mount_key_replaces_and_destroys_earlier_child() {
    let h = Harness::new();
    h.view_models
        .register_component(CONTEXT, "Toolbar", "ToolbarViewModel")
        .register_component(CONTEXT, "toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());

    assert_eq!(composable.children().len(), 1);
    assert_eq!(composable.children()[0].namespace().as_str(), "toolbar");
    assert_eq!(h.toolbar_destroy_count(), 1);
}

#[test]
fn test_scope_teardown_destroys_children_once() {
    let h = Harness::new();
    h.view_models
        .register_component(CONTEXT, "Toolbar", "ToolbarViewModel")
        .register_component(CONTEXT, "SecondaryToolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());
    assert_eq!(composable.children().len(), 2);

    h.scope.destroy();
    h.scope.destroy();
    composable.destroy();

    assert_eq!(h.toolbar_destroy_count(), 2);
    for mounted in composable.children() {
        let child = mounted.component().as_any().downcast_ref::<ToolbarViewModel>().unwrap();
        assert_eq!(child.destroy_count(), 2);
        assert_eq!(child.view_model.lifecycle(), Lifecycle::TornDown);
    }
    assert_eq!(composable.lifecycle(), Lifecycle::TornDown);
}

#[test]
fn test_explicit_destroy_silences_nested_forwarding() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");
    h.properties.register(CONTEXT, "toolbar.order");
    let calls = spy(&h.bus, CONTEXT, "toolbar.order");

    let composable = ComposableViewModel::new(h.params());
    composable.destroy();
    toolbar(&composable).view_model.set("order", "desc");
    h.scope.digest().unwrap();

    assert!(calls.lock().is_empty());
    assert_eq!(h.toolbar_destroy_count(), 1);

    h.scope.destroy();
    assert_eq!(h.toolbar_destroy_count(), 1);
}

#[test]
fn test_unknown_component_type_is_skipped() {
    let h = Harness::new();
    h.view_models
        .register_component(CONTEXT, "Missing", "NoSuchViewModel")
        .register_component(CONTEXT, "Toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());

    assert!(composable.child("missing").is_none());
    assert!(composable.child("toolbar").is_some());
    assert_eq!(h.scope.children().len(), 1);
}

#[test]
fn test_composable_declared_under_its_own_context_is_not_recomposed() {
    let h = Harness::new();
    h.view_models
        .register_component(CONTEXT, "Nested", "ComposableViewModel")
        .register_component(CONTEXT, "Toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());

    let nested = composable.child_as::<ComposableViewModel>("nested").expect("nested is mounted");
    assert!(nested.child("nested").is_none());
    assert!(nested.child("toolbar").is_some());
    assert!(composable.child("toolbar").is_some());
    assert_eq!(h.scope.children().len(), 2);

    h.scope.destroy();
    assert_eq!(h.toolbar_destroy_count(), 2);
    assert_eq!(nested.lifecycle(), Lifecycle::TornDown);
}

#[test]
fn test_runaway_composition_stops_at_depth_limit() {
    let h = Harness::new();
    let depth = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&depth);
    h.factory.register_component("DeeperViewModel", move |mut params: ViewModelParams| {
        let level = params.ancestry.len();
        seen.fetch_max(level, Ordering::SeqCst);
        params.context = format!("Level{level}").into();
        ComposableViewModel::new(params)
    });
    for level in 0..64 {
        let context = if level == 0 { CONTEXT.to_owned() } else { format!("Level{level}") };
        h.view_models.register_component(context, "Deeper", "DeeperViewModel");
    }

    let composable = ComposableViewModel::new(h.params());

    assert!(composable.child("deeper").is_some());
    assert_eq!(depth.load(Ordering::SeqCst), 32);
}

#[test]
fn test_failing_constructor_is_skipped() {
    let h = Harness::new();
    h.factory.register(
        "BrokenViewModel",
        |_params: ViewModelParams| -> Result<ComponentRef, ViewModelError> {
            Err(ViewModelError::Construction { message: "refusing to build".into(), context: None })
        },
    );
    h.view_models
        .register_component(CONTEXT, "Broken", "BrokenViewModel")
        .register_component(CONTEXT, "Toolbar", "ToolbarViewModel");

    let composable = ComposableViewModel::new(h.params());

    assert_eq!(composable.children().len(), 1);
    assert!(composable.child("toolbar").is_some());
    assert_eq!(h.scope.children().len(), 1);
}

#[test]
fn test_unresolvable_nested_keys_are_skipped() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Toolbar", "ToolbarViewModel");
    h.properties
        .register(CONTEXT, "toolbar.missing")
        .register(CONTEXT, "ghost.order")
        .register(CONTEXT, "toolbar.order");
    let missing = spy(&h.bus, CONTEXT, "toolbar.missing");
    let ghost = spy(&h.bus, CONTEXT, "ghost.order");

    let _composable = ComposableViewModel::new(h.params());
    h.scope.digest().unwrap();

    assert!(missing.lock().is_empty());
    assert!(ghost.lock().is_empty());
    assert_eq!(h.scope.watcher_count(), 1);
}

#[test]
fn test_nested_paths_descend_through_composed_children() {
    let h = Harness::new();
    h.factory.register_component("PanelViewModel", |mut params: ViewModelParams| {
        params.context = "PanelContext".into();
        ComposableViewModel::new(params)
    });
    h.view_models
        .register_component(CONTEXT, "Panel", "PanelViewModel")
        .register_component("PanelContext", "Toolbar", "ToolbarViewModel");
    h.properties.register(CONTEXT, "panel.toolbar.order");
    let calls = spy(&h.bus, CONTEXT, "panel.toolbar.order");

    let composable = ComposableViewModel::new(h.params());
    let panel = composable.child_as::<ComposableViewModel>("panel").unwrap();
    toolbar(panel).view_model.set("order", "desc");
    h.scope.digest().unwrap();

    assert_eq!(*calls.lock(), vec![Payload::property("desc", "desc")]);

    h.scope.destroy();
    assert_eq!(h.toolbar_destroy_count(), 1);
}

#[test]
fn test_default_factory_builds_plain_view_models() {
    let h = Harness::new();
    h.view_models.register_component(CONTEXT, "Details", "ViewModel");

    let composable = ComposableViewModel::new(h.params());

    let details = composable.child_as::<weave_viewmodel::ViewModel>("details").unwrap();
    assert_eq!(details.namespace().map(|ns| ns.as_str()), Some("Details"));
}
