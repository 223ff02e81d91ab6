//! Per-instance server configuration builder.
//!
//! Setters record overrides; nothing is resolved until [`build`]. Each build
//! produces an independent `ServerConfig` sharing the process-wide settings.
//!
//! [`build`]: ServerConfigBuilder::build

use std::sync::Arc;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::{self, ConfigKey, ConfigType, KeyScope};
use crate::config::resolver::Resolver;
use crate::config::schema::{ProcessConfig, ServerConfig};
use crate::config::source::Overrides;

/// Collects instance overrides before the transport starts.
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    resolver: Arc<Resolver>,
    process: Arc<ProcessConfig>,
    overrides: Overrides,
}

impl ServerConfigBuilder {
    pub fn new(resolver: Arc<Resolver>, process: Arc<ProcessConfig>) -> Self {
        Self {
            resolver,
            process,
            overrides: Overrides::new(),
        }
    }

    /// Start from an existing override set.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Override an instance-scoped key.
    ///
    /// Process-wide keys are fixed in the shared `ProcessConfig` and are
    /// rejected here.
    pub fn set<T: ConfigType>(self, key: &ConfigKey<T>, value: T) -> ConfigResult<Self> {
        instance_only(key.name(), key.scope())?;
        Ok(self.set_instance(key, value))
    }

    /// Override an instance-scoped key from text, parsed by its declared type.
    pub fn set_raw(mut self, name: &str, raw: &str) -> ConfigResult<Self> {
        if let Some(info) = keys::lookup(name) {
            instance_only(info.name, info.scope)?;
        }
        self.overrides.set_raw(name, raw)?;
        Ok(self)
    }

    fn set_instance<T: ConfigType>(mut self, key: &ConfigKey<T>, value: T) -> Self {
        debug_assert_eq!(key.scope(), KeyScope::Instance);
        self.overrides.set(key, value);
        self
    }

    pub fn server_selector_threads(self, threads: i32) -> Self {
        self.set_instance(&keys::SERVER_SELECTOR_THREADS, threads)
    }

    pub fn server_worker_threads(self, threads: i32) -> Self {
        self.set_instance(&keys::SERVER_WORKER_THREADS, threads)
    }

    pub fn server_socket_send_buf_size(self, bytes: i32) -> Self {
        self.set_instance(&keys::SERVER_SOCKET_SEND_BUF_SIZE, bytes)
    }

    pub fn server_socket_resv_buf_size(self, bytes: i32) -> Self {
        self.set_instance(&keys::SERVER_SOCKET_RESV_BUF_SIZE, bytes)
    }

    pub fn so_back_log_size(self, backlog: i32) -> Self {
        self.set_instance(&keys::SO_BACK_LOG_SIZE, backlog)
    }

    pub fn write_buffer_high_water_mark(self, bytes: i32) -> Self {
        self.set_instance(&keys::WRITE_BUFFER_HIGH_WATER_MARK, bytes)
    }

    pub fn write_buffer_low_water_mark(self, bytes: i32) -> Self {
        self.set_instance(&keys::WRITE_BUFFER_LOW_WATER_MARK, bytes)
    }

    pub fn server_channel_max_idle_time_seconds(self, secs: i32) -> Self {
        self.set_instance(&keys::SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS, secs)
    }

    pub fn boss_thread_prefix(self, prefix: impl Into<String>) -> Self {
        self.set_instance(&keys::BOSS_THREAD_PREFIX, prefix.into())
    }

    pub fn worker_thread_prefix(self, prefix: impl Into<String>) -> Self {
        self.set_instance(&keys::WORKER_THREAD_PREFIX, prefix.into())
    }

    pub fn executor_thread_prefix(self, prefix: impl Into<String>) -> Self {
        self.set_instance(&keys::SERVER_EXECUTOR_THREAD_PREFIX, prefix.into())
    }

    pub fn boss_thread_size(self, threads: i32) -> Self {
        self.set_instance(&keys::BOSS_THREAD_SIZE, threads)
    }

    pub fn shutdown_wait(self, secs: i32) -> Self {
        self.set_instance(&keys::SHUTDOWN_WAIT, secs)
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Resolve every instance key and validate the result.
    pub fn build(&self) -> ConfigResult<ServerConfig> {
        let scope = self.resolver.scope(&self.overrides);
        let config = ServerConfig::resolve(&scope, Arc::clone(&self.process))?;

        tracing::debug!(
            selector_threads = config.selector_threads,
            worker_threads = config.worker_threads,
            send_buffer = config.buffers.send_buffer_bytes,
            high_watermark = config.watermarks.high_watermark_bytes,
            low_watermark = config.watermarks.low_watermark_bytes,
            overrides = self.overrides.len(),
            "Server instance configuration resolved"
        );
        Ok(config)
    }
}

fn instance_only(name: &str, scope: KeyScope) -> ConfigResult<()> {
    match scope {
        KeyScope::Instance => Ok(()),
        KeyScope::Process => Err(ConfigError::ProcessScopedKey(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::source::EnvSource;
    use crate::config::validation::ValidationError;
    use crate::transport::{OsFamily, Platform};

    fn builder(env: EnvSource) -> ServerConfigBuilder {
        let resolver = Arc::new(Resolver::new(env, None));
        let overrides = Overrides::new();
        let process = ProcessConfig::resolve(
            &resolver.scope(&overrides),
            Platform::new(OsFamily::Linux, 4),
        )
        .unwrap();
        ServerConfigBuilder::new(resolver, Arc::new(process))
    }

    #[test]
    fn setter_beats_environment() {
        let env = EnvSource::from_vars([("TRANSPORT_SERVER_SOCKET_SEND_BUF_SIZE", "1000")]);
        let config = builder(env).server_socket_send_buf_size(262_144).build().unwrap();
        assert_eq!(config.buffers.send_buffer_bytes, 262_144);
    }

    #[test]
    fn environment_used_without_setter() {
        let env = EnvSource::from_vars([("TRANSPORT_SO_BACK_LOG_SIZE", "2048")]);
        let config = builder(env).build().unwrap();
        assert_eq!(config.buffers.backlog, 2048);
    }

    #[test]
    fn inverted_watermarks_are_rejected() {
        let err = builder(EnvSource::empty())
            .write_buffer_high_water_mark(500)
            .write_buffer_low_water_mark(1000)
            .build()
            .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::Watermarks { high: 500, low: 1000 }]);
            }
            other => panic!("expected validation failure, got {other}"),
        }
    }

    #[test]
    fn instances_are_independent() {
        let base = builder(EnvSource::empty());
        let a = base.clone().server_worker_threads(3).build().unwrap();
        let b = base.build().unwrap();
        assert_eq!(a.worker_threads, 3);
        assert_eq!(b.worker_threads, 8);
    }

    #[test]
    fn process_keys_are_refused_per_instance() {
        let err = builder(EnvSource::empty())
            .set(&keys::MIN_SERVER_POOL_SIZE, 900)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ProcessScopedKey(ref key) if key == "transport.minServerPoolSize"
        ));

        let err = builder(EnvSource::empty())
            .set_raw("transport.enableTcServerBatchSendResponse", "true")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ProcessScopedKey(_)));

        let config = builder(EnvSource::empty())
            .set(&keys::SO_BACK_LOG_SIZE, 64)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.buffers.backlog, 64);
    }

    #[test]
    fn raw_setter_parses_by_key_type() {
        let config = builder(EnvSource::empty())
            .set_raw("transport.shutdown.wait", "20")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.shutdown_wait_secs, 20);

        assert!(matches!(
            builder(EnvSource::empty()).set_raw("transport.shutdown.wait", "soon"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
