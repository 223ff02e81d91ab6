//! Transport channel and event-loop sizing subsystem.
//!
//! # Data Flow
//! ```text
//! transport.server + host OS
//!     → channel.rs (ServerChannelClass)
//!     → epoll_enabled(class, probe)   re-evaluated per call
//!     → worker thread-name prefix
//!
//! transport.threadFactory.workerThreadSize + processor count
//!     → threads.rs (WorkThreadMode / explicit count)
//!     → default selector and worker thread counts
//! ```
//!
//! # Design Decisions
//! - Platform facts are captured once in `Platform` and passed explicitly
//! - The capability probe is a trait so tests can pin its answer

pub mod channel;
pub mod platform;
pub mod threads;

pub use channel::{
    epoll_enabled, worker_thread_prefix, FixedProbe, OsFamily, PlatformCapabilityProbe,
    ServerChannelClass, SystemProbe, TransportServerType,
};
pub use platform::Platform;
pub use threads::{WorkThreadMode, WorkerThreadSize};
