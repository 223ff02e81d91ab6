//! Idle-connection timeouts.

use std::time::Duration;

use serde::Serialize;

use crate::config::error::ConfigResult;
use crate::config::keys::{self, defaults};
use crate::config::resolver::Scope;
use crate::config::validation::Violations;

/// Idle thresholds, in seconds. Zero disables a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdleTimeouts {
    /// Server-side dead-peer detection.
    pub server_channel_max_idle_secs: u64,
    /// Shared channel read-idle constant.
    pub channel_max_read_idle_secs: u64,
    pub channel_max_write_idle_secs: u64,
    pub channel_max_all_idle_secs: u64,
}

impl IdleTimeouts {
    pub fn server_channel_max_idle(&self) -> Duration {
        Duration::from_secs(self.server_channel_max_idle_secs)
    }

    pub fn channel_max_read_idle(&self) -> Duration {
        Duration::from_secs(self.channel_max_read_idle_secs)
    }

    pub fn resolve(scope: &Scope<'_>, violations: &mut Violations) -> ConfigResult<Self> {
        let server_idle = scope.resolve(
            &keys::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS,
            defaults::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS,
        )?;
        violations.at_least(keys::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS.name(), server_idle, 0);

        Ok(Self {
            server_channel_max_idle_secs: u64::try_from(server_idle).unwrap_or(0),
            ..Self::default()
        })
    }
}

impl Default for IdleTimeouts {
    fn default() -> Self {
        Self {
            server_channel_max_idle_secs: defaults::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS as u64,
            channel_max_read_idle_secs: defaults::MAX_READ_IDLE_SECONDS,
            channel_max_write_idle_secs: defaults::MAX_WRITE_IDLE_SECONDS,
            channel_max_all_idle_secs: defaults::MAX_ALL_IDLE_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolver::Resolver;
    use crate::config::source::Overrides;

    #[test]
    fn default_idle_values() {
        let idle = IdleTimeouts::default();
        assert_eq!(idle.server_channel_max_idle(), Duration::from_secs(30));
        assert_eq!(idle.channel_max_read_idle(), Duration::from_secs(15));
        assert_eq!(idle.channel_max_all_idle_secs, 0);
    }

    #[test]
    fn read_idle_is_not_configurable() {
        let resolver = Resolver::default();
        let mut overrides = Overrides::new();
        overrides.set(&keys::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS, 90);
        let mut v = Violations::new();
        let idle = IdleTimeouts::resolve(&resolver.scope(&overrides), &mut v).unwrap();
        assert_eq!(idle.server_channel_max_idle_secs, 90);
        assert_eq!(idle.channel_max_read_idle_secs, 15);
        assert!(v.is_empty());
    }
}
