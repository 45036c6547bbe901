//! Facade crate for the weave view-model layer.
//! Re-exports the bus, domain and view-model primitives and offers [`Environment`], a ready-made
//! set of shared collaborators for one application scope.
//! Keep this crate thin: it should compose other crates, not implement dispatch logic.
//!
//! ## Usage
//! - Build an [`Environment`] from a [`domain::config::WeaveConfig`] (or load one from a file).
//! - Declare properties, events and children on its registries, register component types on its
//!   factory, then build view-models with [`Environment::view_model`] or
//!   [`Environment::composable`].
//! - Drive change detection with [`Environment::digest`]; tear everything down with
//!   [`Environment::teardown`].

mod environment;

pub use environment::Environment;

pub use weave_bus as bus;
pub use weave_domain as domain;
pub use weave_kernel as kernel;
#[cfg(feature = "logger")]
pub use weave_logger as logger;
pub use weave_viewmodel as viewmodel;

pub use weave_bus::{Bus, Subscription};
pub use weave_domain::{Context, MountKey, Namespace, Payload, Topic};
pub use weave_viewmodel::{
    Buildable, Component, ComponentFactory, ComponentRef, ComposableViewModel, HostObservation,
    Lifecycle, PropertyBag, Registry, Scope, ViewModel, ViewModelError, ViewModelParams,
};

/// Build-time enabled features (by Cargo feature).
pub mod features {
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "logger")]
        "logger",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Installs the global tracing subscriber described by `config.logging`.
///
/// Keep the returned [`logger::Logger`] alive: it owns the file writer guard.
///
/// # Errors
/// Returns [`logger::LoggerError`] on an invalid level or when a subscriber is already installed.
#[cfg(feature = "logger")]
pub fn init_logging(
    name: impl Into<String>,
    config: &domain::config::WeaveConfig,
) -> Result<logger::Logger, logger::LoggerError> {
    logger::Logger::from_config(name, &config.logging)?.init()
}
