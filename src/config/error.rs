//! Error types for configuration resolution.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::keys::ValueKind;
use crate::config::source::Origin;
use crate::config::validation::ValidationError;
use crate::transport::channel::OsFamily;

/// Fatal configuration errors surfaced during startup assembly.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source holds a value that does not parse as the key's type.
    #[error("cannot parse {key}=`{value}` from {origin}: expected {expected}")]
    Parse {
        key: String,
        value: String,
        origin: Origin,
        expected: ValueKind,
    },

    /// An override named a key outside the catalog.
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// A per-instance override named a key resolved once per process.
    #[error("{0} is resolved once per process and cannot be overridden per server instance")]
    ProcessScopedKey(String),

    /// Native transport requested on a platform without one.
    #[error("native transport is not supported on {0}")]
    UnsupportedNativeTransport(OsFamily),

    /// The config-center document exists but is not valid TOML.
    #[error("invalid config document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// One or more resolved values violate an invariant.
    #[error("configuration validation failed: {}", ValidationErrors(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    pub(crate) fn parse(key: &str, value: &str, origin: Origin, expected: ValueKind) -> Self {
        ConfigError::Parse {
            key: key.to_string(),
            value: value.to_string(),
            origin,
            expected,
        }
    }
}

struct ValidationErrors<'a>(&'a [ValidationError]);

impl fmt::Display for ValidationErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// A source could not be consulted; resolution falls through to the next one.
#[derive(Debug, Clone, Error)]
#[error("config source {source_name} unavailable: {reason}")]
pub struct SourceUnavailable {
    pub source_name: String,
    pub reason: String,
}

impl SourceUnavailable {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
