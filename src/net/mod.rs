//! Network-facing transport settings.
//!
//! # Data Flow
//! ```text
//! Resolved scope
//!     → buffers.rs (socket send/receive sizes, backlog, write watermarks)
//!     → idle.rs (server dead-peer timeout, shared channel idle constants)
//!     → ServerConfig (per instance)
//!     → Hand off to the transport bootstrap
//! ```
//!
//! # Design Decisions
//! - Values are resolved per server instance, never per process
//! - Watermark ordering is validated here, alongside the values it constrains
//! - Idle constants shared with the client side are not overridable

pub mod buffers;
pub mod idle;

pub use buffers::{resolve_socket_buffers, resolve_watermarks, SocketBuffers, WatermarkPair};
pub use idle::IdleTimeouts;
