//! # Bus
//!
//! An exact-match, synchronous publish/subscribe broker.
//!
//! ## Overview
//!
//! Subscribers register a handler for a `(context, topic)` pair; publishers deliver a
//! [`Payload`] to every handler of that pair, in subscription order, before `publish` returns.
//!
//! ## Features
//!
//! * **Partitioned**: contexts never see each other's topics.
//! * **Isolated**: a panicking handler is logged and skipped, its siblings still run.
//! * **Reentrant**: handlers may publish or subscribe while being dispatched.
//! * **Cheap to share**: [`Bus`] is a clonable handle over `FxHashMap` + `parking_lot::RwLock`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use weave_bus::{Bus, Payload};
//!
//! let bus = Bus::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! bus.subscribe("SampleContext", "testEvent", move |_: &Payload| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! assert_eq!(bus.publish("SampleContext", "testEvent", Payload::event(10)), 1);
//! assert_eq!(bus.publish("OtherContext", "testEvent", Payload::event(10)), 0);
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

mod bus;

pub use bus::{Bus, Handler, Subscription};
pub use weave_domain::{Context, Payload, Topic};
