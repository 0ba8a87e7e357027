//! Configuration errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ConfigError::ReadFile`] | `CONFIG_READ_FILE` | No |
//! | [`ConfigError::ParseToml`] | `CONFIG_PARSE_TOML` | No |
//! | [`ConfigError::InvalidEnvVar`] | `CONFIG_INVALID_ENV_VAR` | No |
//! | [`ConfigError::InvalidValue`] | `CONFIG_INVALID_VALUE` | No |

use kahuna_protocol::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while loading or validating driver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}")]
    ReadFile {
        /// The file that failed to read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the schema.
    #[error("failed to parse config file {path}")]
    ParseToml {
        /// The file that failed to parse.
        path: PathBuf,
        /// TOML decode failure.
        #[source]
        source: toml::de::Error,
    },

    /// An environment override carried an unparsable value.
    #[error("invalid value for environment variable {name}: {message}")]
    InvalidEnvVar {
        /// The variable name.
        name: &'static str,
        /// Parse failure detail.
        message: String,
    },

    /// A configuration value violates a documented bound.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// The offending field, dotted-path style.
        field: &'static str,
        /// Bound violation detail.
        message: String,
    },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseToml { .. } => "CONFIG_PARSE_TOML",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kahuna_protocol::assert_error_code;

    #[test]
    fn config_error_codes_valid() {
        let errors = [
            ConfigError::InvalidEnvVar {
                name: "KAHUNA_POLL_INTERVAL_MS",
                message: "not a number".into(),
            },
            ConfigError::InvalidValue {
                field: "poll_interval_ms",
                message: "below minimum".into(),
            },
        ];
        for err in &errors {
            assert_error_code(err, "CONFIG_");
        }
    }
}
