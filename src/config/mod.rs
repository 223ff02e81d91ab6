//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! Override (builder setters, --set)
//!     → Environment (TRANSPORT_* variables)
//!     → Config center (loader.rs, flattened TOML document)
//!     → Hardcoded default (keys.rs)
//!
//! resolver.rs walks the chain per key
//!     → validation.rs (semantic checks, all errors at once)
//!     → ProcessConfig (once per process, shared via Arc)
//!     → ServerConfig (once per instance, built by builder.rs)
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable once resolved; nothing re-reads sources later
//! - Every key has a default so an empty environment is a valid setup
//! - Syntax (parse) failures and semantic (validation) failures are distinct errors

pub mod builder;
pub mod error;
pub mod keys;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod validation;

pub use builder::ServerConfigBuilder;
pub use error::{ConfigError, ConfigResult, SourceUnavailable};
pub use keys::{ConfigKey, ConfigValue, KeyInfo, KeyScope, ValueKind};
pub use loader::FileConfigCenter;
pub use resolver::{Resolved, Resolver, Scope};
pub use schema::{ProcessConfig, ResolvedSnapshot, ServerConfig, ThreadNames};
pub use source::{env_var_name, ConfigProvider, EnvSource, Origin, Overrides, StaticConfigCenter};
pub use validation::{ValidationError, Violations};
