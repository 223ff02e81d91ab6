//! Worker pool sizing subsystem.
//!
//! # Data Flow
//! ```text
//! resolved pool keys
//!     → sizer.rs (request pool: elastic; branch-result pool: pinned unless set)
//!     → pool.rs  (SizingMode → ThreadPoolSpec, bounds recorded in Violations)
//!     → handed to the external pool manager
//! ```
//!
//! # Design Decisions
//! - Pools are described, never created here
//! - The two pools share queue capacity and keep-alive settings but are
//!   otherwise independent

pub mod pool;
pub mod sizer;

pub use pool::{SizingMode, ThreadPoolSpec};
pub use sizer::{PoolSizing, ThreadPoolSizer};
