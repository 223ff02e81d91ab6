//! Host facts that feed derived defaults.

use serde::Serialize;

use crate::transport::channel::OsFamily;

/// Host description captured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub os: OsFamily,
    pub available_processors: usize,
}

impl Platform {
    /// Describe the running host.
    pub fn detect() -> Self {
        Self {
            os: OsFamily::current(),
            available_processors: num_cpus::get().max(1),
        }
    }

    /// A fixed host description, used to make derived defaults reproducible.
    pub fn new(os: OsFamily, available_processors: usize) -> Self {
        Self {
            os,
            available_processors: available_processors.max(1),
        }
    }
}
