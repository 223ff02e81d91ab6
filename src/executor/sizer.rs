//! Pool dimensioning for request handling and branch-result callbacks.

use serde::Serialize;

use crate::config::error::ConfigResult;
use crate::config::keys::{self, defaults};
use crate::config::resolver::Scope;
use crate::config::validation::Violations;
use crate::executor::pool::{PoolLimits, SizingMode, ThreadPoolSpec};
use crate::transport::threads::WorkThreadMode;
use crate::transport::Platform;

/// The two independent server-side pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSizing {
    /// Elastic pool executing incoming requests.
    pub request: ThreadPoolSpec,
    /// Pool dedicated to branch (sub-transaction) outcome callbacks.
    pub branch_result: ThreadPoolSpec,
    /// Mode the branch-result bounds were derived from.
    pub branch_result_mode: SizingMode,
}

/// Derives pool bounds from the resolved configuration.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPoolSizer<'a> {
    scope: Scope<'a>,
    platform: Platform,
}

impl<'a> ThreadPoolSizer<'a> {
    pub fn new(scope: Scope<'a>, platform: Platform) -> Self {
        Self { scope, platform }
    }

    /// Thread count of the pinned sizing mode on this host.
    pub fn pinned_threads(&self) -> usize {
        WorkThreadMode::Pin.threads(&self.platform)
    }

    /// Resolve both pools, recording bound violations.
    pub fn size(&self, violations: &mut Violations) -> ConfigResult<PoolSizing> {
        let queue_capacity = self
            .scope
            .resolve(&keys::MAX_TASK_QUEUE_SIZE, defaults::MAX_TASK_QUEUE_SIZE)?;
        let keep_alive_millis = self
            .scope
            .resolve(&keys::KEEP_ALIVE_TIME, defaults::KEEP_ALIVE_TIME_MS)?;
        violations.at_least(keys::MAX_TASK_QUEUE_SIZE.name(), queue_capacity, 1);
        violations.at_least(keys::KEEP_ALIVE_TIME.name(), keep_alive_millis, 0);

        let request_mode = self.request_mode()?;
        let request = request_mode.into_spec(
            PoolLimits {
                name: "request",
                thread_name: defaults::REQUEST_POOL_THREAD_NAME,
                min_key: keys::MIN_SERVER_POOL_SIZE.name(),
                max_key: keys::MAX_SERVER_POOL_SIZE.name(),
                queue_capacity,
                keep_alive_millis,
            },
            self.pinned_threads(),
            violations,
        );

        let branch_result_mode = self.branch_result_mode()?;
        let branch_result = branch_result_mode.into_spec(
            PoolLimits {
                name: "branch-result",
                thread_name: defaults::BRANCH_RESULT_POOL_THREAD_NAME,
                min_key: keys::MIN_BRANCH_RESULT_POOL_SIZE.name(),
                max_key: keys::MAX_BRANCH_RESULT_POOL_SIZE.name(),
                queue_capacity,
                keep_alive_millis,
            },
            self.pinned_threads(),
            violations,
        );

        Ok(PoolSizing {
            request,
            branch_result,
            branch_result_mode,
        })
    }

    /// The request pool is always elastic.
    pub fn request_mode(&self) -> ConfigResult<SizingMode> {
        let min = self
            .scope
            .resolve(&keys::MIN_SERVER_POOL_SIZE, defaults::MIN_SERVER_POOL_SIZE)?;
        let max = self
            .scope
            .resolve(&keys::MAX_SERVER_POOL_SIZE, defaults::MAX_SERVER_POOL_SIZE)?;
        Ok(SizingMode::Elastic { min, max })
    }

    /// Pinned unless a source sets either bound.
    pub fn branch_result_mode(&self) -> ConfigResult<SizingMode> {
        let min = self.scope.resolve_optional(&keys::MIN_BRANCH_RESULT_POOL_SIZE)?;
        let max = self.scope.resolve_optional(&keys::MAX_BRANCH_RESULT_POOL_SIZE)?;
        if min.is_none() && max.is_none() {
            return Ok(SizingMode::Pinned);
        }

        let (pinned, _) = SizingMode::Pinned.bounds(self.pinned_threads());
        Ok(SizingMode::Elastic {
            min: min.map(|r| r.value).unwrap_or(pinned),
            max: max.map(|r| r.value).unwrap_or(pinned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::resolver::Resolver;
    use crate::config::source::{EnvSource, Overrides};
    use crate::config::validation::ValidationError;
    use crate::transport::OsFamily;

    fn platform() -> Platform {
        Platform::new(OsFamily::Linux, 4)
    }

    #[test]
    fn defaults_without_any_source() {
        let resolver = Resolver::default();
        let overrides = Overrides::new();
        let sizer = ThreadPoolSizer::new(resolver.scope(&overrides), platform());
        let mut v = Violations::new();
        let pools = sizer.size(&mut v).unwrap();
        assert!(v.is_empty());

        assert_eq!(pools.request.min_threads, 50);
        assert_eq!(pools.request.max_threads, 500);
        assert_eq!(pools.request.queue_capacity, 20_000);
        assert_eq!(pools.request.keep_alive_millis, 500);
        assert_eq!(pools.request.name, "ServerHandlerThread");

        assert_eq!(pools.branch_result_mode, SizingMode::Pinned);
        assert_eq!(pools.branch_result.min_threads, 4);
        assert_eq!(pools.branch_result.max_threads, 4);
        assert_eq!(pools.branch_result.name, "BranchResultHandlerThread");
    }

    #[test]
    fn one_branch_bound_makes_pool_elastic() {
        let resolver = Resolver::new(
            EnvSource::from_vars([("TRANSPORT_MAX_BRANCH_RESULT_POOL_SIZE", "16")]),
            None,
        );
        let overrides = Overrides::new();
        let sizer = ThreadPoolSizer::new(resolver.scope(&overrides), platform());
        assert_eq!(
            sizer.branch_result_mode().unwrap(),
            SizingMode::Elastic { min: 4, max: 16 }
        );
    }

    #[test]
    fn inverted_request_bounds_are_reported() {
        let resolver = Resolver::default();
        let mut overrides = Overrides::new();
        overrides
            .set(&keys::MIN_SERVER_POOL_SIZE, 600)
            .set(&keys::MAX_SERVER_POOL_SIZE, 500);
        let sizer = ThreadPoolSizer::new(resolver.scope(&overrides), platform());
        let mut v = Violations::new();
        sizer.size(&mut v).unwrap();
        assert!(!v.is_empty());
    }

    #[test]
    fn shared_queue_limit_is_reported_once() {
        let resolver = Resolver::default();
        let mut overrides = Overrides::new();
        overrides
            .set(&keys::MAX_TASK_QUEUE_SIZE, 0)
            .set(&keys::KEEP_ALIVE_TIME, -5);
        let sizer = ThreadPoolSizer::new(resolver.scope(&overrides), platform());
        let mut v = Violations::new();
        sizer.size(&mut v).unwrap();
        assert_eq!(
            v.into_errors(),
            vec![
                ValidationError::Range {
                    key: "transport.maxTaskQueueSize",
                    value: 0,
                    min: 1
                },
                ValidationError::Range {
                    key: "transport.keepAliveTime",
                    value: -5,
                    min: 0
                },
            ]
        );
    }
}
