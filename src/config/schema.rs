//! Resolved configuration snapshots.
//!
//! `ProcessConfig` holds keys resolved once per process and shared by every
//! server instance. `ServerConfig` holds keys resolved once per instance.
//! Both are immutable after construction.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::{self, defaults};
use crate::config::resolver::Scope;
use crate::config::validation::Violations;
use crate::executor::{PoolSizing, ThreadPoolSizer, ThreadPoolSpec};
use crate::net::{IdleTimeouts, SocketBuffers, WatermarkPair};
use crate::transport::{
    epoll_enabled, worker_thread_prefix, Platform, PlatformCapabilityProbe, ServerChannelClass,
    TransportServerType, WorkerThreadSize,
};

/// Process-wide transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessConfig {
    /// Request and branch-result pool bounds.
    pub pools: PoolSizing,

    /// Whether the coordinator batches responses on the same channel.
    pub enable_batch_send_response: bool,

    /// Timeout for RPC requests issued by the coordinator, in milliseconds.
    pub rpc_request_timeout_millis: u64,

    pub server_type: TransportServerType,

    /// Channel class selected for `server_type` on this host.
    pub channel_class: ServerChannelClass,

    pub worker_thread_size: WorkerThreadSize,

    pub platform: Platform,
}

impl ProcessConfig {
    /// Resolve every process-wide key.
    pub fn resolve(scope: &Scope<'_>, platform: Platform) -> ConfigResult<Self> {
        let mut violations = Violations::new();

        let pools = ThreadPoolSizer::new(*scope, platform).size(&mut violations)?;

        let enable_batch_send_response = scope.resolve(
            &keys::ENABLE_TC_SERVER_BATCH_SEND_RESPONSE,
            defaults::ENABLE_TC_SERVER_BATCH_SEND_RESPONSE,
        )?;

        let rpc_timeout = scope.resolve(
            &keys::RPC_TC_REQUEST_TIMEOUT,
            defaults::RPC_TC_REQUEST_TIMEOUT_MS,
        )?;
        violations.at_least(keys::RPC_TC_REQUEST_TIMEOUT.name(), rpc_timeout, 1);

        let server_type = resolve_server_type(scope)?;
        let channel_class = ServerChannelClass::select(server_type, platform.os)?;
        let worker_thread_size = WorkerThreadSize::resolve(scope)?;

        violations.into_result()?;

        Ok(Self {
            pools,
            enable_batch_send_response,
            rpc_request_timeout_millis: u64::try_from(rpc_timeout).unwrap_or(0),
            server_type,
            channel_class,
            worker_thread_size,
            platform,
        })
    }

    pub fn request_pool(&self) -> &ThreadPoolSpec {
        &self.pools.request
    }

    pub fn branch_result_pool(&self) -> &ThreadPoolSpec {
        &self.pools.branch_result
    }

    pub fn rpc_request_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_request_timeout_millis)
    }

    /// Default for selector and worker thread counts.
    pub fn default_worker_threads(&self) -> usize {
        self.worker_thread_size.threads(&self.platform)
    }
}

fn resolve_server_type(scope: &Scope<'_>) -> ConfigResult<TransportServerType> {
    match scope.resolve_optional(&keys::TRANSPORT_SERVER)? {
        None => Ok(TransportServerType::Nio),
        Some(found) => found.value.parse().map_err(|_| {
            ConfigError::parse(
                keys::TRANSPORT_SERVER.name(),
                &found.value,
                found.origin,
                keys::TRANSPORT_SERVER.kind(),
            )
        }),
    }
}

/// Thread-name prefixes for the transport's thread roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadNames {
    pub boss_prefix: String,
    /// Explicit worker prefix; when absent the prefix follows the epoll decision.
    pub worker_prefix_override: Option<String>,
    pub executor_prefix: String,
}

/// Per-instance transport configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    #[serde(skip)]
    pub(crate) process: Arc<ProcessConfig>,

    pub selector_threads: usize,
    pub worker_threads: usize,
    pub boss_threads: usize,
    pub buffers: SocketBuffers,
    pub watermarks: WatermarkPair,
    pub idle: IdleTimeouts,
    pub thread_names: ThreadNames,
    pub shutdown_wait_secs: u64,
}

impl ServerConfig {
    /// Resolve every instance-scoped key on top of `process`.
    pub(crate) fn resolve(scope: &Scope<'_>, process: Arc<ProcessConfig>) -> ConfigResult<Self> {
        let mut violations = Violations::new();
        let default_threads = i32::try_from(process.default_worker_threads()).unwrap_or(i32::MAX);

        let selector_threads = scope.resolve(&keys::SERVER_SELECTOR_THREADS, default_threads)?;
        let worker_threads = scope.resolve(&keys::SERVER_WORKER_THREADS, default_threads)?;
        let boss_threads = scope.resolve(&keys::BOSS_THREAD_SIZE, defaults::BOSS_THREAD_SIZE)?;
        violations.at_least(keys::SERVER_SELECTOR_THREADS.name(), selector_threads, 1);
        violations.at_least(keys::SERVER_WORKER_THREADS.name(), worker_threads, 1);
        violations.at_least(keys::BOSS_THREAD_SIZE.name(), boss_threads, 1);

        let buffers = crate::net::resolve_socket_buffers(scope, &mut violations)?;
        let watermarks = crate::net::resolve_watermarks(scope, &mut violations)?;
        let idle = IdleTimeouts::resolve(scope, &mut violations)?;

        let thread_names = ThreadNames {
            boss_prefix: scope.resolve(
                &keys::BOSS_THREAD_PREFIX,
                defaults::BOSS_THREAD_PREFIX.to_string(),
            )?,
            worker_prefix_override: scope
                .resolve_optional(&keys::WORKER_THREAD_PREFIX)?
                .map(|found| found.value),
            executor_prefix: scope.resolve(
                &keys::SERVER_EXECUTOR_THREAD_PREFIX,
                defaults::EXECUTOR_THREAD_PREFIX.to_string(),
            )?,
        };

        let shutdown_wait = scope.resolve(&keys::SHUTDOWN_WAIT, defaults::SHUTDOWN_WAIT_SECONDS)?;
        violations.at_least(keys::SHUTDOWN_WAIT.name(), shutdown_wait, 0);

        violations.into_result()?;

        Ok(Self {
            process,
            selector_threads: to_usize(selector_threads),
            worker_threads: to_usize(worker_threads),
            boss_threads: to_usize(boss_threads),
            buffers,
            watermarks,
            idle,
            thread_names,
            shutdown_wait_secs: u64::try_from(shutdown_wait).unwrap_or(0),
        })
    }

    /// Process-wide settings this instance was built on.
    pub fn process(&self) -> &ProcessConfig {
        &self.process
    }

    /// Listen port. Fixed; no source can change it.
    pub fn listen_port(&self) -> u16 {
        defaults::LISTEN_PORT
    }

    /// Whether the epoll channel is usable right now.
    pub fn epoll_enabled(&self, probe: &dyn PlatformCapabilityProbe) -> bool {
        epoll_enabled(self.process.channel_class, probe)
    }

    /// Worker thread-name prefix, re-derived from `probe` on every call.
    pub fn worker_thread_prefix(&self, probe: &dyn PlatformCapabilityProbe) -> String {
        worker_thread_prefix(
            self.thread_names.worker_prefix_override.as_deref(),
            self.process.channel_class,
            probe,
        )
    }

    pub fn boss_thread_prefix(&self) -> &str {
        &self.thread_names.boss_prefix
    }

    pub fn executor_thread_prefix(&self) -> &str {
        &self.thread_names.executor_prefix
    }

    pub fn channel_max_read_idle(&self) -> Duration {
        self.idle.channel_max_read_idle()
    }

    pub fn server_channel_max_idle(&self) -> Duration {
        self.idle.server_channel_max_idle()
    }

    pub fn shutdown_wait(&self) -> Duration {
        Duration::from_secs(self.shutdown_wait_secs)
    }
}

fn to_usize(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}

/// Flat, printable view of everything the transport bootstrap consumes.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSnapshot {
    pub listen_port: u16,
    pub epoll_enabled: bool,
    pub worker_thread_prefix: String,
    pub process: ProcessConfig,
    pub server: ServerConfig,
}

impl ResolvedSnapshot {
    pub fn capture(server: &ServerConfig, probe: &dyn PlatformCapabilityProbe) -> Self {
        Self {
            listen_port: server.listen_port(),
            epoll_enabled: server.epoll_enabled(probe),
            worker_thread_prefix: server.worker_thread_prefix(probe),
            process: server.process().clone(),
            server: server.clone(),
        }
    }
}
