//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the source chain (environment, optional config center)
//! - Check every catalog key present in a source for parse errors
//! - Resolve the process-wide configuration exactly once
//! - Hand out builders for per-instance configuration
//!
//! # Design Decisions
//! - Fail fast: any parse or validation error is fatal
//! - The context is an explicit value passed to consumers, never a global
//! - Each test builds its own context from injected sources

use std::path::Path;
use std::sync::Arc;

use crate::config::builder::ServerConfigBuilder;
use crate::config::error::ConfigResult;
use crate::config::loader::FileConfigCenter;
use crate::config::resolver::Resolver;
use crate::config::schema::{ProcessConfig, ResolvedSnapshot, ServerConfig};
use crate::config::source::{EnvSource, Overrides};
use crate::transport::{Platform, PlatformCapabilityProbe, SystemProbe};

/// Everything resolved at process start, shared by all server instances.
#[derive(Clone)]
pub struct TransportContext {
    resolver: Arc<Resolver>,
    process: Arc<ProcessConfig>,
    overrides: Overrides,
    probe: Arc<dyn PlatformCapabilityProbe>,
}

impl TransportContext {
    /// Assemble a context from explicit parts.
    ///
    /// `overrides` apply to process-wide keys here and seed every instance
    /// builder, so an override of an instance key set at startup also wins
    /// for each server built from this context.
    pub fn assemble(
        resolver: Resolver,
        overrides: Overrides,
        platform: Platform,
        probe: Arc<dyn PlatformCapabilityProbe>,
    ) -> ConfigResult<Self> {
        let scope = resolver.scope(&overrides);
        scope.check_catalog()?;

        let process = ProcessConfig::resolve(&scope, platform)?;

        tracing::info!(
            os = %platform.os,
            processors = platform.available_processors,
            server_type = %process.server_type,
            channel = ?process.channel_class,
            request_pool_min = process.pools.request.min_threads,
            request_pool_max = process.pools.request.max_threads,
            branch_result_pool_min = process.pools.branch_result.min_threads,
            branch_result_pool_max = process.pools.branch_result.max_threads,
            rpc_timeout_ms = process.rpc_request_timeout_millis,
            "Transport process configuration resolved"
        );

        Ok(Self {
            resolver: Arc::new(resolver),
            process: Arc::new(process),
            overrides,
            probe,
        })
    }

    /// Assemble from the real environment, an optional config-center file,
    /// and the detected host.
    pub fn from_system(config_center: Option<&Path>, overrides: Overrides) -> ConfigResult<Self> {
        let resolver = match config_center {
            Some(path) => {
                let center = FileConfigCenter::open(path)?;
                tracing::info!(
                    path = %center.path().display(),
                    reachable = center.is_reachable(),
                    "Config center attached"
                );
                Resolver::with_center(EnvSource::system(), center)
            }
            None => Resolver::system(),
        };
        Self::assemble(resolver, overrides, Platform::detect(), Arc::new(SystemProbe))
    }

    pub fn process(&self) -> &Arc<ProcessConfig> {
        &self.process
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Overrides supplied at startup.
    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn probe(&self) -> &dyn PlatformCapabilityProbe {
        self.probe.as_ref()
    }

    /// Builder for one server instance.
    pub fn server_config(&self) -> ServerConfigBuilder {
        ServerConfigBuilder::new(Arc::clone(&self.resolver), Arc::clone(&self.process))
            .with_overrides(self.overrides.clone())
    }

    /// Printable view of `server` with the probe's current answer.
    pub fn snapshot(&self, server: &ServerConfig) -> ResolvedSnapshot {
        ResolvedSnapshot::capture(server, self.probe())
    }
}

impl std::fmt::Debug for TransportContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportContext")
            .field("resolver", &self.resolver)
            .field("process", &self.process)
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
