//! Configuration key catalog.
//!
//! Every key the transport layer recognises is declared here once, with the
//! semantic type its raw value must parse to and the scope it resolves in.
//! Hardcoded defaults live next to the keys in [`defaults`].

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

/// Prefix shared by every transport key.
pub const TRANSPORT_PREFIX: &str = "transport.";

/// Semantic type of a configuration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Int,
    Long,
    Bool,
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
        };
        f.write_str(name)
    }
}

/// A typed configuration value, as stored by in-process overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Int(i32),
    Long(i64),
    Bool(bool),
    String(String),
}

impl ConfigValue {
    /// Kind of the contained value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Int(_) => ValueKind::Int,
            ConfigValue::Long(_) => ValueKind::Long,
            ConfigValue::Bool(_) => ValueKind::Bool,
            ConfigValue::String(_) => ValueKind::String,
        }
    }

    /// Parse a raw string as the given kind.
    ///
    /// Returns `None` when the text is not a valid value of that kind.
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Self> {
        match kind {
            ValueKind::Int => i32::parse_raw(raw).map(ConfigValue::Int),
            ValueKind::Long => i64::parse_raw(raw).map(ConfigValue::Long),
            ValueKind::Bool => bool::parse_raw(raw).map(ConfigValue::Bool),
            ValueKind::String => String::parse_raw(raw).map(ConfigValue::String),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(v) => write!(f, "{}", v),
            ConfigValue::Long(v) => write!(f, "{}", v),
            ConfigValue::Bool(v) => write!(f, "{}", v),
            ConfigValue::String(v) => f.write_str(v),
        }
    }
}

/// Rust types a configuration key can resolve to.
pub trait ConfigType: Clone + fmt::Debug + fmt::Display + Sized {
    const KIND: ValueKind;

    /// Parse a raw, non-blank source value.
    fn parse_raw(raw: &str) -> Option<Self>;

    /// Extract from an override value of the same kind.
    fn from_value(value: &ConfigValue) -> Option<Self>;

    fn into_value(self) -> ConfigValue;
}

impl ConfigType for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn parse_raw(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> ConfigValue {
        ConfigValue::Int(self)
    }
}

impl ConfigType for i64 {
    const KIND: ValueKind = ValueKind::Long;

    fn parse_raw(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> ConfigValue {
        ConfigValue::Long(self)
    }
}

impl ConfigType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn parse_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        }
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> ConfigValue {
        ConfigValue::Bool(self)
    }
}

impl ConfigType for String {
    const KIND: ValueKind = ValueKind::String;

    fn parse_raw(raw: &str) -> Option<Self> {
        Some(raw.trim().to_string())
    }

    fn from_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::String(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn into_value(self) -> ConfigValue {
        ConfigValue::String(self)
    }
}

/// Whether a key is resolved once per process or once per server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScope {
    Process,
    Instance,
}

/// A typed configuration key.
pub struct ConfigKey<T> {
    name: &'static str,
    scope: KeyScope,
    _type: PhantomData<fn() -> T>,
}

impl<T: ConfigType> ConfigKey<T> {
    pub const fn new(name: &'static str, scope: KeyScope) -> Self {
        Self {
            name,
            scope,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> KeyScope {
        self.scope
    }

    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    /// Untyped description of this key.
    pub fn info(&self) -> KeyInfo {
        KeyInfo {
            name: self.name,
            kind: T::KIND,
            scope: self.scope,
        }
    }
}

impl<T> fmt::Debug for ConfigKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Untyped catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub name: &'static str,
    pub kind: ValueKind,
    pub scope: KeyScope,
}

// Process-wide keys.
pub const MIN_SERVER_POOL_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.minServerPoolSize", KeyScope::Process);
pub const MAX_SERVER_POOL_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.maxServerPoolSize", KeyScope::Process);
pub const MAX_TASK_QUEUE_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.maxTaskQueueSize", KeyScope::Process);
pub const KEEP_ALIVE_TIME: ConfigKey<i32> =
    ConfigKey::new("transport.keepAliveTime", KeyScope::Process);
pub const MIN_BRANCH_RESULT_POOL_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.minBranchResultPoolSize", KeyScope::Process);
pub const MAX_BRANCH_RESULT_POOL_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.maxBranchResultPoolSize", KeyScope::Process);
pub const ENABLE_TC_SERVER_BATCH_SEND_RESPONSE: ConfigKey<bool> =
    ConfigKey::new("transport.enableTcServerBatchSendResponse", KeyScope::Process);
pub const RPC_TC_REQUEST_TIMEOUT: ConfigKey<i64> =
    ConfigKey::new("transport.rpcTcRequestTimeout", KeyScope::Process);
pub const TRANSPORT_SERVER: ConfigKey<String> =
    ConfigKey::new("transport.server", KeyScope::Process);
pub const WORKER_THREAD_SIZE: ConfigKey<String> =
    ConfigKey::new("transport.threadFactory.workerThreadSize", KeyScope::Process);

// Instance-scoped keys.
pub const SERVER_SELECTOR_THREADS: ConfigKey<i32> =
    ConfigKey::new("transport.serverSelectorThreads", KeyScope::Instance);
pub const SERVER_WORKER_THREADS: ConfigKey<i32> =
    ConfigKey::new("transport.serverWorkerThreads", KeyScope::Instance);
pub const SERVER_SOCKET_SEND_BUF_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.serverSocketSendBufSize", KeyScope::Instance);
pub const SERVER_SOCKET_RESV_BUF_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.serverSocketResvBufSize", KeyScope::Instance);
pub const SO_BACK_LOG_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.soBackLogSize", KeyScope::Instance);
pub const WRITE_BUFFER_HIGH_WATER_MARK: ConfigKey<i32> =
    ConfigKey::new("transport.writeBufferHighWaterMark", KeyScope::Instance);
pub const WRITE_BUFFER_LOW_WATER_MARK: ConfigKey<i32> =
    ConfigKey::new("transport.writeBufferLowWaterMark", KeyScope::Instance);
pub const SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS: ConfigKey<i32> =
    ConfigKey::new("transport.serverChannelMaxIdleTimeSeconds", KeyScope::Instance);
pub const BOSS_THREAD_PREFIX: ConfigKey<String> =
    ConfigKey::new("transport.threadFactory.bossThreadPrefix", KeyScope::Instance);
pub const WORKER_THREAD_PREFIX: ConfigKey<String> =
    ConfigKey::new("transport.threadFactory.workerThreadPrefix", KeyScope::Instance);
pub const SERVER_EXECUTOR_THREAD_PREFIX: ConfigKey<String> = ConfigKey::new(
    "transport.threadFactory.serverExecutorThreadPrefix",
    KeyScope::Instance,
);
pub const BOSS_THREAD_SIZE: ConfigKey<i32> =
    ConfigKey::new("transport.threadFactory.bossThreadSize", KeyScope::Instance);
pub const SHUTDOWN_WAIT: ConfigKey<i32> =
    ConfigKey::new("transport.shutdown.wait", KeyScope::Instance);

/// Every recognised key, process-wide keys first.
pub fn catalog() -> [KeyInfo; 23] {
    [
        MIN_SERVER_POOL_SIZE.info(),
        MAX_SERVER_POOL_SIZE.info(),
        MAX_TASK_QUEUE_SIZE.info(),
        KEEP_ALIVE_TIME.info(),
        MIN_BRANCH_RESULT_POOL_SIZE.info(),
        MAX_BRANCH_RESULT_POOL_SIZE.info(),
        ENABLE_TC_SERVER_BATCH_SEND_RESPONSE.info(),
        RPC_TC_REQUEST_TIMEOUT.info(),
        TRANSPORT_SERVER.info(),
        WORKER_THREAD_SIZE.info(),
        SERVER_SELECTOR_THREADS.info(),
        SERVER_WORKER_THREADS.info(),
        SERVER_SOCKET_SEND_BUF_SIZE.info(),
        SERVER_SOCKET_RESV_BUF_SIZE.info(),
        SO_BACK_LOG_SIZE.info(),
        WRITE_BUFFER_HIGH_WATER_MARK.info(),
        WRITE_BUFFER_LOW_WATER_MARK.info(),
        SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS.info(),
        BOSS_THREAD_PREFIX.info(),
        WORKER_THREAD_PREFIX.info(),
        SERVER_EXECUTOR_THREAD_PREFIX.info(),
        BOSS_THREAD_SIZE.info(),
        SHUTDOWN_WAIT.info(),
    ]
}

/// Look a key up by name.
pub fn lookup(name: &str) -> Option<KeyInfo> {
    catalog().into_iter().find(|info| info.name == name)
}

/// Hardcoded defaults, the lowest-precedence source.
pub mod defaults {
    /// Fixed listen port; no source can change it.
    pub const LISTEN_PORT: u16 = 8091;

    pub const MIN_SERVER_POOL_SIZE: i32 = 50;
    pub const MAX_SERVER_POOL_SIZE: i32 = 500;
    pub const MAX_TASK_QUEUE_SIZE: i32 = 20_000;
    pub const KEEP_ALIVE_TIME_MS: i32 = 500;
    pub const ENABLE_TC_SERVER_BATCH_SEND_RESPONSE: bool = false;
    pub const RPC_TC_REQUEST_TIMEOUT_MS: i64 = 15_000;
    pub const TRANSPORT_SERVER: &str = "NIO";

    pub const SERVER_SOCKET_SEND_BUF_SIZE: i32 = 153_600;
    pub const SERVER_SOCKET_RESV_BUF_SIZE: i32 = 153_600;
    pub const SO_BACK_LOG_SIZE: i32 = 1024;
    pub const WRITE_BUFFER_HIGH_WATER_MARK: i32 = 67_108_864;
    pub const WRITE_BUFFER_LOW_WATER_MARK: i32 = 1_048_576;
    pub const SERVER_CHANNEL_MAX_IDLE_TIME_SECONDS: i32 = 30;

    pub const BOSS_THREAD_PREFIX: &str = "NettyBoss";
    pub const EPOLL_WORKER_THREAD_PREFIX: &str = "NettyServerEPollWorker";
    pub const NIO_WORKER_THREAD_PREFIX: &str = "NettyServerNIOWorker";
    pub const EXECUTOR_THREAD_PREFIX: &str = "NettyServerBizHandler";
    pub const BOSS_THREAD_SIZE: i32 = 1;
    pub const SHUTDOWN_WAIT_SECONDS: i32 = 13;

    pub const REQUEST_POOL_THREAD_NAME: &str = "ServerHandlerThread";
    pub const BRANCH_RESULT_POOL_THREAD_NAME: &str = "BranchResultHandlerThread";

    /// Write idle period shared by every channel.
    pub const MAX_WRITE_IDLE_SECONDS: u64 = 5;
    /// Read idle is three write-idle periods.
    pub const MAX_READ_IDLE_SECONDS: u64 = MAX_WRITE_IDLE_SECONDS * 3;
    /// All-idle detection is disabled.
    pub const MAX_ALL_IDLE_SECONDS: u64 = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_names_are_unique_and_prefixed() {
        let names: HashSet<_> = catalog().iter().map(|k| k.name).collect();
        assert_eq!(names.len(), catalog().len());
        assert!(catalog().iter().all(|k| k.name.starts_with(TRANSPORT_PREFIX)));
    }

    #[test]
    fn lookup_returns_declared_kind() {
        let info = lookup("transport.rpcTcRequestTimeout").unwrap();
        assert_eq!(info.kind, ValueKind::Long);
        assert_eq!(info.scope, KeyScope::Process);
        assert!(lookup("transport.listenPort").is_none());
    }

    #[test]
    fn parse_bool_is_strict() {
        assert_eq!(bool::parse_raw(" Yes "), Some(true));
        assert_eq!(bool::parse_raw("0"), Some(false));
        assert_eq!(bool::parse_raw("maybe"), None);
    }

    #[test]
    fn parse_int_rejects_non_numeric() {
        assert_eq!(i32::parse_raw(" 42 "), Some(42));
        assert_eq!(i32::parse_raw("forty-two"), None);
        assert_eq!(i32::parse_raw("3000000000"), None);
        assert_eq!(i64::parse_raw("3000000000"), Some(3_000_000_000));
    }

    #[test]
    fn default_watermarks_are_ordered() {
        assert!(defaults::WRITE_BUFFER_HIGH_WATER_MARK > defaults::WRITE_BUFFER_LOW_WATER_MARK);
        assert!(defaults::MIN_SERVER_POOL_SIZE <= defaults::MAX_SERVER_POOL_SIZE);
    }
}
