//! Layered configuration loading.
//!
//! Resolution order, later layers winning:
//!
//! 1. Built-in defaults ([`KahunaConfig::default`])
//! 2. An optional TOML file
//! 3. `KAHUNA_*` environment variables
//!
//! Environment overrides cover the knobs operators actually turn in
//! the lab; structural settings stay file-only.

use crate::config::error::ConfigError;
use crate::config::types::KahunaConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_POLL_INTERVAL_MS: &str = "KAHUNA_POLL_INTERVAL_MS";
const ENV_DISCOVERY_TIMEOUT_S: &str = "KAHUNA_DISCOVERY_TIMEOUT_S";
const ENV_PROBLEM_THRESHOLD: &str = "KAHUNA_PROBLEM_THRESHOLD";
const ENV_RECORD: &str = "KAHUNA_RECORD";
const ENV_RECORD_DIR: &str = "KAHUNA_RECORD_DIR";

/// Builder-style configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with defaults only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers a TOML file over the defaults. The file may restate any
    /// subset of the schema.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Disables the environment layer. Tests use this so ambient
    /// variables cannot leak into assertions.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Resolves the configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed,
    /// an environment override is unparsable, or a resolved value is
    /// out of bounds.
    pub fn load(self) -> Result<KahunaConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => Self::from_file(path)?,
            None => KahunaConfig::default(),
        };

        if !self.skip_env {
            apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<KahunaConfig, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

fn apply_env_overrides(config: &mut KahunaConfig) -> Result<(), ConfigError> {
    if let Some(value) = env_parse::<u64>(ENV_POLL_INTERVAL_MS)? {
        config.poll_interval_ms = value;
    }
    if let Some(value) = env_parse::<u64>(ENV_DISCOVERY_TIMEOUT_S)? {
        config.discovery_timeout_s = value;
    }
    if let Some(value) = env_parse::<u32>(ENV_PROBLEM_THRESHOLD)? {
        config.problem_threshold = value;
    }
    if let Some(value) = env_parse::<bool>(ENV_RECORD)? {
        config.record.enabled = value;
    }
    if let Ok(dir) = std::env::var(ENV_RECORD_DIR) {
        config.record.dir = Some(PathBuf::from(dir));
    }
    Ok(())
}

fn env_parse<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar {
                name,
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
