//! Configuration sources.
//!
//! # Responsibilities
//! - Define the raw lookup contract every source implements
//! - Process environment source (property layer)
//! - In-memory config center
//! - Typed in-process overrides
//!
//! # Design Decisions
//! - Sources return raw strings; parsing belongs to the resolver so a
//!   malformed value can be reported with its origin
//! - Blank values are treated as absent
//! - An unreachable source reports `SourceUnavailable` instead of failing

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;

use serde::Serialize;

use crate::config::error::{ConfigError, ConfigResult, SourceUnavailable};
use crate::config::keys::{self, ConfigKey, ConfigType, ConfigValue};

/// Where a resolved value came from, highest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    Override,
    Environment,
    ConfigCenter,
    Default,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Origin::Override => "override",
            Origin::Environment => "environment",
            Origin::ConfigCenter => "config-center",
            Origin::Default => "default",
        };
        f.write_str(name)
    }
}

/// A key/value configuration source.
///
/// Implementors only provide [`get_raw`](ConfigProvider::get_raw); the typed
/// getters are layered on top of it. A typed getter falls back to its default
/// when the key is absent or the source is unreachable, but never when the
/// value is present and malformed.
pub trait ConfigProvider: Send + Sync {
    /// Human-readable source name for logs.
    fn name(&self) -> &str;

    /// Raw value for `key`, `Ok(None)` when the key is absent.
    fn get_raw(&self, key: &str) -> Result<Option<String>, SourceUnavailable>;

    /// Precedence slot this source occupies in the resolution chain.
    fn origin(&self) -> Origin {
        Origin::ConfigCenter
    }

    fn get_int(&self, key: &str, default: i32) -> ConfigResult<i32> {
        typed_lookup(self, key, default)
    }

    fn get_long(&self, key: &str, default: i64) -> ConfigResult<i64> {
        typed_lookup(self, key, default)
    }

    fn get_boolean(&self, key: &str, default: bool) -> ConfigResult<bool> {
        typed_lookup(self, key, default)
    }

    fn get_string(&self, key: &str, default: &str) -> ConfigResult<String> {
        typed_lookup(self, key, default.to_string())
    }
}

fn typed_lookup<T, P>(provider: &P, key: &str, default: T) -> ConfigResult<T>
where
    T: ConfigType,
    P: ConfigProvider + ?Sized,
{
    match provider.get_raw(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => T::parse_raw(&raw)
            .ok_or_else(|| ConfigError::parse(key, &raw, provider.origin(), T::KIND)),
        Ok(_) => Ok(default),
        Err(e) => {
            tracing::debug!(key = %key, error = %e, "Config source unavailable, using default");
            Ok(default)
        }
    }
}

/// Map a dotted key to its environment variable name.
///
/// `transport.serverSocketSendBufSize` becomes
/// `TRANSPORT_SERVER_SOCKET_SEND_BUF_SIZE`.
pub fn env_var_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 8);
    let mut prev_lower = false;
    for c in key.chars() {
        if c == '.' || c == '-' {
            out.push('_');
            prev_lower = false;
        } else if c.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(c);
            prev_lower = false;
        } else {
            out.push(c.to_ascii_uppercase());
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    out
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Process environment source.
pub struct EnvSource {
    lookup: Lookup,
}

impl EnvSource {
    /// Read from the real process environment.
    pub fn system() -> Self {
        Self::with_os_lookup(|name| std::env::var_os(name))
    }

    /// Read through a lookup returning platform strings.
    ///
    /// A value that is not valid UTF-8 is passed on lossily, so it fails to
    /// parse instead of reading as absent.
    pub fn with_os_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString> + Send + Sync + 'static,
    {
        Self::with_lookup(move |name| {
            lookup(name).map(|value| value.to_string_lossy().into_owned())
        })
    }

    /// Read through an arbitrary lookup, keyed by environment variable name.
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Read from a fixed map of environment variables.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_lookup(move |name| vars.get(name).cloned())
    }

    /// An environment that defines nothing.
    pub fn empty() -> Self {
        Self::with_lookup(|_| None)
    }
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvSource").finish_non_exhaustive()
    }
}

impl ConfigProvider for EnvSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn origin(&self) -> Origin {
        Origin::Environment
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, SourceUnavailable> {
        Ok((self.lookup)(&env_var_name(key)))
    }
}

/// In-memory config center, keyed by dotted key.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigCenter {
    values: HashMap<String, String>,
    unavailable: Option<String>,
}

impl StaticConfigCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// A center that fails every lookup with the given reason.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::warn!(
            reason = %reason,
            "Config center unreachable, falling back to lower-precedence sources"
        );
        Self {
            values: HashMap::new(),
            unavailable: Some(reason),
        }
    }
}

impl ConfigProvider for StaticConfigCenter {
    fn name(&self) -> &str {
        "static-config-center"
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, SourceUnavailable> {
        if let Some(reason) = &self.unavailable {
            return Err(SourceUnavailable::new(self.name(), reason.clone()));
        }
        Ok(self.values.get(key).cloned())
    }
}

/// Explicit in-process overrides, the highest-precedence source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    values: HashMap<&'static str, ConfigValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a typed override.
    pub fn set<T: ConfigType>(&mut self, key: &ConfigKey<T>, value: T) -> &mut Self {
        self.values.insert(key.name(), value.into_value());
        self
    }

    /// Set an override from text, parsed by the key's declared type.
    pub fn set_raw(&mut self, name: &str, raw: &str) -> ConfigResult<&mut Self> {
        let info = keys::lookup(name).ok_or_else(|| ConfigError::UnknownKey(name.to_string()))?;
        let value = ConfigValue::parse(info.kind, raw)
            .ok_or_else(|| ConfigError::parse(name, raw, Origin::Override, info.kind))?;
        self.values.insert(info.name, value);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
