//! Precedence-chain resolution.
//!
//! # Responsibilities
//! - Consult sources in strict order: override, environment, config center,
//!   hardcoded default
//! - Parse raw values to the key's declared type
//! - Distinguish "absent" (fall through) from "present but invalid" (fail)
//!
//! # Design Decisions
//! - The resolver is immutable and shared; overrides are supplied per
//!   resolution scope so process-wide and per-instance overrides never mix
//! - An unreachable source is skipped, never surfaced; the source itself
//!   warns once when it finds it cannot be reached
//! - Nothing is cached here; callers resolve once and keep the snapshot

use std::fmt;
use std::sync::Arc;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::{self, ConfigKey, ConfigType, ConfigValue, KeyInfo, ValueKind};
use crate::config::source::{ConfigProvider, EnvSource, Origin, Overrides};

/// Ordered chain of lower-precedence sources.
#[derive(Clone)]
pub struct Resolver {
    layers: Vec<Arc<dyn ConfigProvider>>,
}

impl Resolver {
    /// Chain with the given environment source and an optional config center.
    pub fn new(env: EnvSource, center: Option<Arc<dyn ConfigProvider>>) -> Self {
        let mut layers: Vec<Arc<dyn ConfigProvider>> = vec![Arc::new(env)];
        layers.extend(center);
        Self::from_layers(layers)
    }

    /// Chain with the given environment source in front of a config center.
    pub fn with_center<C>(env: EnvSource, center: C) -> Self
    where
        C: ConfigProvider + 'static,
    {
        let center: Arc<dyn ConfigProvider> = Arc::new(center);
        Self::new(env, Some(center))
    }

    /// Chain over the real process environment only.
    pub fn system() -> Self {
        Self::new(EnvSource::system(), None)
    }

    /// Chain from arbitrary providers. Layers are ordered by their origin.
    pub fn from_layers(mut layers: Vec<Arc<dyn ConfigProvider>>) -> Self {
        layers.sort_by_key(|layer| layer.origin());
        Self { layers }
    }

    /// Resolution view combining this chain with a set of overrides.
    pub fn scope<'a>(&'a self, overrides: &'a Overrides) -> Scope<'a> {
        Scope {
            resolver: self,
            overrides,
        }
    }

    /// Find the first layer holding a non-blank value for `key`.
    fn lookup(&self, key: &str) -> Option<(String, Origin)> {
        for layer in &self.layers {
            match layer.get_raw(key) {
                Ok(Some(raw)) if !raw.trim().is_empty() => return Some((raw, layer.origin())),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(
                        key = %key,
                        source = %layer.name(),
                        error = %e,
                        "Config source unavailable, falling through"
                    );
                }
            }
        }
        None
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.layers.iter().map(|l| l.name()).collect();
        f.debug_struct("Resolver").field("layers", &names).finish()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(EnvSource::empty(), None)
    }
}

/// A resolved value together with the source that supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub origin: Origin,
}

/// A resolver bound to one set of overrides.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    resolver: &'a Resolver,
    overrides: &'a Overrides,
}

impl<'a> Scope<'a> {
    /// Resolve `key`, falling back to `default` when no source has it.
    pub fn resolve<T: ConfigType>(&self, key: &ConfigKey<T>, default: T) -> ConfigResult<T> {
        Ok(self.resolve_with_origin(key, default)?.value)
    }

    /// Resolve `key` and report which source won.
    pub fn resolve_with_origin<T: ConfigType>(
        &self,
        key: &ConfigKey<T>,
        default: T,
    ) -> ConfigResult<Resolved<T>> {
        let resolved = match self.resolve_optional(key)? {
            Some(found) => found,
            None => Resolved {
                value: default,
                origin: Origin::Default,
            },
        };

        tracing::debug!(
            key = %key.name(),
            origin = %resolved.origin,
            value = %resolved.value,
            "Resolved config key"
        );
        Ok(resolved)
    }

    /// Resolve `key` without a default; `None` when every source is silent.
    pub fn resolve_optional<T: ConfigType>(
        &self,
        key: &ConfigKey<T>,
    ) -> ConfigResult<Option<Resolved<T>>> {
        if let Some(value) = self.overrides.get(key.name()) {
            let value = T::from_value(value)
                .ok_or_else(|| {
                    ConfigError::parse(key.name(), &value.to_string(), Origin::Override, T::KIND)
                })?;
            return Ok(Some(Resolved {
                value,
                origin: Origin::Override,
            }));
        }

        match self.resolver.lookup(key.name()) {
            Some((raw, origin)) => {
                let value = T::parse_raw(&raw)
                    .ok_or_else(|| ConfigError::parse(key.name(), &raw, origin, T::KIND))?;
                Ok(Some(Resolved { value, origin }))
            }
            None => Ok(None),
        }
    }

    /// Which source would supply `key`, without parsing it.
    pub fn origin_of(&self, key: &KeyInfo) -> Origin {
        if self.overrides.contains(key.name) {
            return Origin::Override;
        }
        self.resolver
            .lookup(key.name)
            .map(|(_, origin)| origin)
            .unwrap_or(Origin::Default)
    }

    /// Parse every catalog key present in any source, reporting the first
    /// malformed value.
    pub fn check_catalog(&self) -> ConfigResult<()> {
        for info in keys::catalog() {
            if self.overrides.contains(info.name) {
                continue;
            }
            if let Some((raw, origin)) = self.resolver.lookup(info.name) {
                check_kind(info.name, info.kind, &raw, origin)?;
            }
        }
        Ok(())
    }
}

fn check_kind(key: &str, kind: ValueKind, raw: &str, origin: Origin) -> ConfigResult<()> {
    ConfigValue::parse(kind, raw)
        .map(|_| ())
        .ok_or_else(|| ConfigError::parse(key, raw, origin, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys::{
        ENABLE_TC_SERVER_BATCH_SEND_RESPONSE, KEEP_ALIVE_TIME, RPC_TC_REQUEST_TIMEOUT,
        SERVER_SOCKET_SEND_BUF_SIZE, TRANSPORT_SERVER,
    };
    use crate::config::source::StaticConfigCenter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::{self, Layer, SubscriberExt};

    fn resolver(env: &[(&str, &str)], center: StaticConfigCenter) -> Resolver {
        let vars: Vec<(String, String)> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Resolver::with_center(EnvSource::from_vars(vars), center)
    }

    #[test]
    fn default_when_no_source_has_key() {
        let resolver = resolver(&[], StaticConfigCenter::new());
        let overrides = Overrides::new();
        let got = resolver
            .scope(&overrides)
            .resolve_with_origin(&KEEP_ALIVE_TIME, 500)
            .unwrap();
        assert_eq!(got.value, 500);
        assert_eq!(got.origin, Origin::Default);
    }

    #[test]
    fn precedence_override_env_center_default() {
        let center = StaticConfigCenter::new().with("transport.serverSocketSendBufSize", "3");
        let resolver = resolver(&[("TRANSPORT_SERVER_SOCKET_SEND_BUF_SIZE", "2")], center);

        let mut overrides = Overrides::new();
        overrides.set(&SERVER_SOCKET_SEND_BUF_SIZE, 1);
        let got = resolver
            .scope(&overrides)
            .resolve_with_origin(&SERVER_SOCKET_SEND_BUF_SIZE, 4)
            .unwrap();
        assert_eq!((got.value, got.origin), (1, Origin::Override));

        let empty = Overrides::new();
        let got = resolver
            .scope(&empty)
            .resolve_with_origin(&SERVER_SOCKET_SEND_BUF_SIZE, 4)
            .unwrap();
        assert_eq!((got.value, got.origin), (2, Origin::Environment));

        let center = StaticConfigCenter::new().with("transport.serverSocketSendBufSize", "3");
        let resolver = resolver_center_only(center);
        let got = resolver
            .scope(&empty)
            .resolve_with_origin(&SERVER_SOCKET_SEND_BUF_SIZE, 4)
            .unwrap();
        assert_eq!((got.value, got.origin), (3, Origin::ConfigCenter));
    }

    fn resolver_center_only(center: StaticConfigCenter) -> Resolver {
        Resolver::with_center(EnvSource::empty(), center)
    }

    #[test]
    fn malformed_value_fails_instead_of_defaulting() {
        let resolver = resolver(
            &[("TRANSPORT_KEEP_ALIVE_TIME", "half a second")],
            StaticConfigCenter::new().with("transport.keepAliveTime", "700"),
        );
        let overrides = Overrides::new();
        let err = resolver
            .scope(&overrides)
            .resolve(&KEEP_ALIVE_TIME, 500)
            .unwrap_err();
        match err {
            ConfigError::Parse { key, origin, expected, .. } => {
                assert_eq!(key, "transport.keepAliveTime");
                assert_eq!(origin, Origin::Environment);
                assert_eq!(expected, ValueKind::Int);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreachable_center_falls_through_to_default() {
        let resolver = resolver(&[], StaticConfigCenter::unreachable("timeout"));
        let overrides = Overrides::new();
        let got = resolver
            .scope(&overrides)
            .resolve_with_origin(&RPC_TC_REQUEST_TIMEOUT, 15_000)
            .unwrap();
        assert_eq!((got.value, got.origin), (15_000, Origin::Default));
    }

    #[test]
    fn blank_value_counts_as_absent() {
        let resolver = resolver(
            &[("TRANSPORT_SERVER", "   ")],
            StaticConfigCenter::new().with("transport.server", "NATIVE"),
        );
        let overrides = Overrides::new();
        let got = resolver
            .scope(&overrides)
            .resolve_with_origin(&TRANSPORT_SERVER, "NIO".to_string())
            .unwrap();
        assert_eq!(got.value, "NATIVE");
        assert_eq!(got.origin, Origin::ConfigCenter);
    }

    #[test]
    fn optional_resolution_reports_absence() {
        let resolver = Resolver::default();
        let overrides = Overrides::new();
        assert!(resolver
            .scope(&overrides)
            .resolve_optional(&ENABLE_TC_SERVER_BATCH_SEND_RESPONSE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn origin_of_and_catalog_check() {
        let resolver = resolver(
            &[("TRANSPORT_SO_BACK_LOG_SIZE", "many")],
            StaticConfigCenter::new().with("transport.server", "NIO"),
        );
        let mut overrides = Overrides::new();
        overrides.set(&KEEP_ALIVE_TIME, 10);
        let scope = resolver.scope(&overrides);

        assert_eq!(scope.origin_of(&KEEP_ALIVE_TIME.info()), Origin::Override);
        assert_eq!(scope.origin_of(&TRANSPORT_SERVER.info()), Origin::ConfigCenter);
        assert_eq!(
            scope.origin_of(&keys::SO_BACK_LOG_SIZE.info()),
            Origin::Environment
        );
        assert_eq!(
            scope.origin_of(&keys::SHUTDOWN_WAIT.info()),
            Origin::Default
        );
        assert!(matches!(scope.check_catalog(), Err(ConfigError::Parse { .. })));
    }

    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: layer::Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn unreachable_center_warns_once() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&warnings)));

        tracing::subscriber::with_default(subscriber, || {
            let resolver = resolver(&[], StaticConfigCenter::unreachable("timeout"));
            let overrides = Overrides::new();
            let scope = resolver.scope(&overrides);

            for info in keys::catalog() {
                assert_eq!(scope.origin_of(&info), Origin::Default);
            }
            scope.check_catalog().unwrap();
            scope.resolve(&KEEP_ALIVE_TIME, 500).unwrap();
            scope.resolve(&SERVER_SOCKET_SEND_BUF_SIZE, 1).unwrap();
        });

        assert_eq!(warnings.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn layers_sorted_by_origin() {
        let center: Arc<dyn ConfigProvider> =
            Arc::new(StaticConfigCenter::new().with("transport.keepAliveTime", "1"));
        let env: Arc<dyn ConfigProvider> =
            Arc::new(EnvSource::from_vars([("TRANSPORT_KEEP_ALIVE_TIME", "2")]));
        let resolver = Resolver::from_layers(vec![center, env]);
        let overrides = Overrides::new();
        assert_eq!(
            resolver.scope(&overrides).resolve(&KEEP_ALIVE_TIME, 0).unwrap(),
            2
        );
    }
}
