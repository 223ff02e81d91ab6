//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! config and lifecycle produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stderr (the binary keeps stdout for the snapshot)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`key`, `origin`, `source`) on every resolution event
//! - Level configurable via `RUST_LOG`, falling back to the CLI level

pub mod logging;

pub use logging::init_logging;
