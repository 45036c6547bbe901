//! # Domain Models
//!
//! Pure value types shared by the bus, the registries and the view-models.
//! Keep it lean: no I/O and no dispatch logic, just data and simple helpers.

pub mod config;
pub mod naming;
pub mod payload;

pub use naming::{Context, MountKey, Namespace, Topic};
pub use payload::Payload;
