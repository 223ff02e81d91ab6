//! Shared utilities for integration tests.

use std::sync::Arc;

use tc_transport_config::config::{
    ConfigResult, EnvSource, Overrides, Resolver, StaticConfigCenter,
};
use tc_transport_config::transport::{FixedProbe, OsFamily, Platform};
use tc_transport_config::TransportContext;

/// Fixed four-processor Linux host.
pub fn linux_host() -> Platform {
    Platform::new(OsFamily::Linux, 4)
}

/// Environment built from literal pairs, never the real process environment.
pub fn env(vars: &[(&str, &str)]) -> EnvSource {
    let owned: Vec<(String, String)> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvSource::from_vars(owned)
}

/// Context over the given sources on a Linux host with a fixed epoll answer.
pub fn context(
    env: EnvSource,
    center: StaticConfigCenter,
    overrides: Overrides,
    epoll_available: bool,
) -> ConfigResult<TransportContext> {
    TransportContext::assemble(
        Resolver::with_center(env, center),
        overrides,
        linux_host(),
        Arc::new(FixedProbe(epoll_available)),
    )
}

/// Context with no configuration anywhere.
#[allow(dead_code)]
pub fn empty_context() -> TransportContext {
    context(EnvSource::empty(), StaticConfigCenter::new(), Overrides::new(), true)
        .expect("empty configuration must resolve")
}
