use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;
use weave_domain::config::WeaveConfig;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// The document parsed but holds values the runtime cannot use.
    #[error("Invalid configuration{}: {message}", format_context(.context))]
    Invalid { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Adds a human readable context to a failed configuration step.
pub trait ConfigErrorExt<T> {
    /// # Errors
    /// Returns the original error wrapped into [`ConfigError`] with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError>;
}

impl<T> ConfigErrorExt<T> for Result<T, config::ConfigError> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, ConfigError> {
        self.map_err(|source| ConfigError::Config { source, context: Some(context.into()) })
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}

/// Environment variable prefix for overrides (`WEAVE__SCOPE__DIGEST_TTL=4`).
pub const ENV_PREFIX: &str = "WEAVE";

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// 1. **Base File**: settings from `path` (any format the `config` crate detects from the
///    extension). Defaults to `"weave"` in the working directory.
/// 2. **Environment Overrides**: variables prefixed with `WEAVE__`; nested keys are separated by
///    double underscores (`WEAVE__LOGGING__LEVEL` maps to `logging.level`).
///
/// # Errors
/// Returns [`ConfigError::Config`] if the file is missing or its content does not match `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = path.map_or_else(|| PathBuf::from("weave"), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("__").separator("__"));

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads and validates a [`WeaveConfig`].
///
/// # Errors
/// Everything [`load_config`] returns, plus [`ConfigError::Invalid`] when `scope.digest_ttl`
/// is zero.
pub fn load_weave_config(path: Option<impl AsRef<Path>>) -> Result<WeaveConfig, ConfigError> {
    let config = load_config::<WeaveConfig>(path)?;
    validate(&config)?;
    Ok(config)
}

/// Checks the invariants serde cannot express.
///
/// # Errors
/// Returns [`ConfigError::Invalid`] when `scope.digest_ttl` is zero.
pub fn validate(config: &WeaveConfig) -> Result<(), ConfigError> {
    if config.scope.digest_ttl == 0 {
        return Err(ConfigError::Invalid {
            message: "scope.digest_ttl must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}
