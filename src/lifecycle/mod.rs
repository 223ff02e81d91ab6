//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build source chain → Check catalog → Resolve process config
//!     → TransportContext → server_config() builders → ServerConfig per instance
//! ```
//!
//! # Design Decisions
//! - Ordered startup: sources first, then process-wide keys, then instances
//! - Process-wide values are fixed once the context exists
//! - Instance overrides must be set before the transport starts

pub mod startup;

pub use startup::TransportContext;
