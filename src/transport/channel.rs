//! Server channel selection.
//!
//! # Responsibilities
//! - Map the configured transport server type and host OS to a channel class
//! - Decide whether the epoll channel is actually usable
//! - Pick the worker thread-name prefix matching that decision
//!
//! # Design Decisions
//! - `epoll_enabled` is a pure function of its inputs and is never cached
//! - An explicit worker prefix always beats the derived one

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::defaults;

/// Host operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl OsFamily {
    /// Family of the OS this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Other
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsFamily::Linux => "linux",
            OsFamily::MacOs => "macos",
            OsFamily::Windows => "windows",
            OsFamily::Other => "other",
        };
        f.write_str(name)
    }
}

/// Configured transport server implementation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportServerType {
    /// Portable readiness-based I/O.
    Nio,
    /// OS-native event facility (epoll / kqueue).
    Native,
}

impl FromStr for TransportServerType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NIO" => Ok(TransportServerType::Nio),
            "NATIVE" => Ok(TransportServerType::Native),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TransportServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportServerType::Nio => f.write_str("NIO"),
            TransportServerType::Native => f.write_str("NATIVE"),
        }
    }
}

/// Server socket channel implementation handed to the transport bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerChannelClass {
    Nio,
    Epoll,
    KQueue,
}

impl ServerChannelClass {
    /// Channel class for a server type on a given OS.
    pub fn select(server_type: TransportServerType, os: OsFamily) -> ConfigResult<Self> {
        match (server_type, os) {
            (TransportServerType::Nio, _) => Ok(ServerChannelClass::Nio),
            (TransportServerType::Native, OsFamily::Windows) => {
                Err(ConfigError::UnsupportedNativeTransport(os))
            }
            (TransportServerType::Native, OsFamily::MacOs) => Ok(ServerChannelClass::KQueue),
            (TransportServerType::Native, _) => Ok(ServerChannelClass::Epoll),
        }
    }
}

/// Reports whether the epoll facility works on the running kernel.
pub trait PlatformCapabilityProbe: Send + Sync {
    fn epoll_available(&self) -> bool;
}

/// Probe for the host this process runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl PlatformCapabilityProbe for SystemProbe {
    fn epoll_available(&self) -> bool {
        cfg!(target_os = "linux")
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub bool);

impl PlatformCapabilityProbe for FixedProbe {
    fn epoll_available(&self) -> bool {
        self.0
    }
}

/// True iff the configured class is epoll and the probe reports it usable.
pub fn epoll_enabled(channel: ServerChannelClass, probe: &dyn PlatformCapabilityProbe) -> bool {
    channel == ServerChannelClass::Epoll && probe.epoll_available()
}

/// Worker thread-name prefix: the override if set, else the epoll or the
/// portable prefix depending on [`epoll_enabled`].
pub fn worker_thread_prefix(
    override_prefix: Option<&str>,
    channel: ServerChannelClass,
    probe: &dyn PlatformCapabilityProbe,
) -> String {
    match override_prefix {
        Some(prefix) => prefix.to_string(),
        None if epoll_enabled(channel, probe) => defaults::EPOLL_WORKER_THREAD_PREFIX.to_string(),
        None => defaults::NIO_WORKER_THREAD_PREFIX.to_string(),
    }
}
