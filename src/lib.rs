//! Transaction coordinator server transport configuration.
//!
//! Resolves the settings the server transport bootstrap consumes: thread
//! counts, socket buffers, write watermarks, idle timeouts, channel class and
//! the bounds of the request and branch-result pools.

// Core subsystems
pub mod config;
pub mod executor;
pub mod net;
pub mod transport;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigError, ConfigResult, ProcessConfig, ServerConfig, ServerConfigBuilder};
pub use lifecycle::TransportContext;
