//! Event-loop thread sizing.
//!
//! The worker thread size is either an explicit count or one of the named
//! modes below, each derived from the processor count. It becomes the
//! default for both selector and worker threads.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::{self, ValueKind};
use crate::config::resolver::Scope;
use crate::config::source::Origin;
use crate::transport::platform::Platform;

/// Named worker thread sizing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkThreadMode {
    /// `2 * cpus + 1`
    Auto,
    /// `cpus`
    Pin,
    /// `cpus + 1`
    BusyPin,
    /// `2 * cpus`
    Default,
}

impl WorkThreadMode {
    /// Thread count this mode yields on `platform`.
    pub fn threads(self, platform: &Platform) -> usize {
        let cpus = platform.available_processors;
        match self {
            WorkThreadMode::Auto => cpus * 2 + 1,
            WorkThreadMode::Pin => cpus,
            WorkThreadMode::BusyPin => cpus + 1,
            WorkThreadMode::Default => cpus * 2,
        }
    }
}

impl FromStr for WorkThreadMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(WorkThreadMode::Auto),
            "pin" => Ok(WorkThreadMode::Pin),
            "busypin" => Ok(WorkThreadMode::BusyPin),
            "default" => Ok(WorkThreadMode::Default),
            _ => Err(()),
        }
    }
}

impl fmt::Display for WorkThreadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Resolved worker thread size setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum WorkerThreadSize {
    Mode(WorkThreadMode),
    Count(usize),
}

impl WorkerThreadSize {
    pub fn threads(&self, platform: &Platform) -> usize {
        match self {
            WorkerThreadSize::Mode(mode) => mode.threads(platform),
            WorkerThreadSize::Count(n) => *n,
        }
    }

    /// Parse a number or mode name.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<usize>() {
            return (n > 0).then_some(WorkerThreadSize::Count(n));
        }
        raw.parse().ok().map(WorkerThreadSize::Mode)
    }

    /// Resolve the worker thread size key.
    pub fn resolve(scope: &Scope<'_>) -> ConfigResult<Self> {
        match scope.resolve_optional(&keys::WORKER_THREAD_SIZE)? {
            None => Ok(WorkerThreadSize::Mode(WorkThreadMode::Default)),
            Some(found) => Self::parse(&found.value).ok_or_else(|| {
                worker_size_error(&found.value, found.origin)
            }),
        }
    }
}

impl Default for WorkerThreadSize {
    fn default() -> Self {
        WorkerThreadSize::Mode(WorkThreadMode::Default)
    }
}

fn worker_size_error(value: &str, origin: Origin) -> ConfigError {
    ConfigError::parse(keys::WORKER_THREAD_SIZE.name(), value, origin, ValueKind::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolver::Resolver;
    use crate::config::source::{EnvSource, Overrides};
    use crate::transport::channel::OsFamily;

    fn four_cpus() -> Platform {
        Platform::new(OsFamily::Linux, 4)
    }

    #[test]
    fn mode_sizes() {
        let p = four_cpus();
        assert_eq!(WorkThreadMode::Auto.threads(&p), 9);
        assert_eq!(WorkThreadMode::Pin.threads(&p), 4);
        assert_eq!(WorkThreadMode::BusyPin.threads(&p), 5);
        assert_eq!(WorkThreadMode::Default.threads(&p), 8);
    }

    #[test]
    fn parse_number_or_mode() {
        assert_eq!(WorkerThreadSize::parse("16"), Some(WorkerThreadSize::Count(16)));
        assert_eq!(
            WorkerThreadSize::parse("busyPin"),
            Some(WorkerThreadSize::Mode(WorkThreadMode::BusyPin))
        );
        assert_eq!(WorkerThreadSize::parse("0"), None);
        assert_eq!(WorkerThreadSize::parse("lots"), None);
    }

    #[test]
    fn resolve_defaults_to_default_mode() {
        let resolver = Resolver::default();
        let overrides = Overrides::new();
        let size = WorkerThreadSize::resolve(&resolver.scope(&overrides)).unwrap();
        assert_eq!(size, WorkerThreadSize::Mode(WorkThreadMode::Default));
        assert_eq!(size.threads(&four_cpus()), 8);
    }

    #[test]
    fn resolve_rejects_unknown_mode() {
        let resolver = Resolver::new(
            EnvSource::from_vars([("TRANSPORT_THREAD_FACTORY_WORKER_THREAD_SIZE", "Turbo")]),
            None,
        );
        let overrides = Overrides::new();
        let err = WorkerThreadSize::resolve(&resolver.scope(&overrides)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { origin: Origin::Environment, .. }));
    }
}
