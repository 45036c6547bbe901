//! # View-models
//!
//! Binds component state to the [`Bus`]: declared properties are watched through the host's
//! change-detection cycle and republished as `{newValue, oldValue}` messages, declared events are
//! forwarded as `{data}` messages, and composable view-models build, mount and forward their
//! declared children.
//!
//! ## Pieces
//!
//! * [`Registry`]: which property, event and component keys a context recognizes.
//! * [`HostObservation`]: the host primitives (`watch`, `on_event`, `on_destroy`, `derive`),
//!   with [`Scope`] as the reference implementation.
//! * [`ViewModel`]: one-shot wiring of a [`PropertyBag`] and the host's events to the bus.
//! * [`ComposableViewModel`]: a view-model that also mounts children built by a
//!   [`ComponentFactory`] and tears them down with its scope.
//!
//! # Example
//!
//! ```rust
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//! use weave_viewmodel::{Bus, Payload, Registry, Scope, ViewModel, ViewModelParams};
//!
//! # fn main() -> Result<(), weave_viewmodel::ViewModelError> {
//! let properties = Registry::new();
//! properties.register("SampleContext", "testProperty");
//!
//! let bus = Bus::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! bus.subscribe("SampleContext", "testProperty", move |p: &Payload| sink.lock().push(p.clone()));
//!
//! let scope = Scope::root();
//! let view_model = ViewModel::new(
//!     ViewModelParams::builder()
//!         .context("SampleContext")
//!         .host(scope.handle())
//!         .bus(bus)
//!         .properties_registry(properties)
//!         .build(),
//! );
//!
//! view_model.set("testProperty", 20);
//! scope.digest()?;
//!
//! assert_eq!(*seen.lock(), vec![Payload::property(20, 20)]);
//! # Ok(())
//! # }
//! ```

mod component;
mod composable;
mod error;
mod factory;
mod host;
mod properties;
mod registry;
mod scope;
mod viewmodel;

pub use component::{Component, ComponentRef};
pub use composable::{ComposableViewModel, MountedChild};
pub use error::{ViewModelError, ViewModelErrorExt};
pub use factory::{Buildable, ComponentFactory};
pub use host::{Accessor, ChangeListener, EventListener, HostObservation, HostRef, TeardownHook};
pub use properties::PropertyBag;
pub use registry::{Declaration, Registry};
pub use scope::Scope;
pub use viewmodel::{Lifecycle, ViewModel, ViewModelParams};

pub use weave_bus::Bus;
pub use weave_domain::{Context, MountKey, Namespace, Payload, Topic};
