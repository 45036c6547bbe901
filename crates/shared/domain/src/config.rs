use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration for an application embedding the dispatch core.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeaveConfig {
    pub logging: LoggingConfig,
    pub scope: ScopeConfig,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Extra env-filter directives, e.g. `weave_bus=trace`. `RUST_LOG` still applies.
    pub filter: Option<String>,
    pub json: bool,
    pub console: bool,
    /// When set, a daily-rotated log file is written into this directory as well.
    pub directory: Option<PathBuf>,
}

/// Host change-detection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Maximum number of passes a single digest may take before it is considered unstable.
    pub digest_ttl: usize,
}

// --- Default ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, json: false, console: true, directory: None }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self { digest_ttl: 10 }
    }
}
