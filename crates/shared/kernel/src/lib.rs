//! Kernel utilities shared across crates.
//! Keep this crate lightweight; it re-exports the domain types and owns configuration loading.
//!
//! ## Config loading
//! ```rust,no_run
//! use weave_kernel::config::load_weave_config;
//!
//! let cfg = load_weave_config(Some("weave")).unwrap_or_default();
//! assert!(cfg.scope.digest_ttl > 0);
//! ```

pub mod config;

pub use weave_domain as domain;
