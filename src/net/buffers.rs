//! Socket buffer and write-backpressure sizing.
//!
//! # Responsibilities
//! - Resolve send/receive buffer sizes and the listen backlog
//! - Resolve the write watermark pair
//! - Reject pairs whose high mark does not exceed the low mark
//!
//! # Semantics consumed by the transport
//! When unsent bytes queued on a connection rise above `high`, writers are
//! told to pause; once the queue drains to `low` or below, they resume.

use serde::Serialize;

use crate::config::error::ConfigResult;
use crate::config::keys::{self, defaults};
use crate::config::resolver::Scope;
use crate::config::validation::Violations;

/// Write-backpressure thresholds in bytes. `high > low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatermarkPair {
    pub high_watermark_bytes: usize,
    pub low_watermark_bytes: usize,
}

impl WatermarkPair {
    /// Whether a writer with `pending` unsent bytes should pause.
    pub fn should_pause(&self, pending: usize) -> bool {
        pending > self.high_watermark_bytes
    }

    /// Whether a paused writer with `pending` unsent bytes may resume.
    pub fn should_resume(&self, pending: usize) -> bool {
        pending <= self.low_watermark_bytes
    }
}

impl Default for WatermarkPair {
    fn default() -> Self {
        Self {
            high_watermark_bytes: defaults::WRITE_BUFFER_HIGH_WATER_MARK as usize,
            low_watermark_bytes: defaults::WRITE_BUFFER_LOW_WATER_MARK as usize,
        }
    }
}

/// Socket-level sizes for accepted connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SocketBuffers {
    pub send_buffer_bytes: usize,
    pub receive_buffer_bytes: usize,
    /// Pending connections the listen socket queues before refusing.
    pub backlog: usize,
}

impl Default for SocketBuffers {
    fn default() -> Self {
        Self {
            send_buffer_bytes: defaults::SERVER_SOCKET_SEND_BUF_SIZE as usize,
            receive_buffer_bytes: defaults::SERVER_SOCKET_RESV_BUF_SIZE as usize,
            backlog: defaults::SO_BACK_LOG_SIZE as usize,
        }
    }
}

/// Resolve socket buffers, recording non-positive sizes.
pub fn resolve_socket_buffers(
    scope: &Scope<'_>,
    violations: &mut Violations,
) -> ConfigResult<SocketBuffers> {
    let send = scope.resolve(
        &keys::SERVER_SOCKET_SEND_BUF_SIZE,
        defaults::SERVER_SOCKET_SEND_BUF_SIZE,
    )?;
    let receive = scope.resolve(
        &keys::SERVER_SOCKET_RESV_BUF_SIZE,
        defaults::SERVER_SOCKET_RESV_BUF_SIZE,
    )?;
    let backlog = scope.resolve(&keys::SO_BACK_LOG_SIZE, defaults::SO_BACK_LOG_SIZE)?;

    violations.at_least(keys::SERVER_SOCKET_SEND_BUF_SIZE.name(), send, 1);
    violations.at_least(keys::SERVER_SOCKET_RESV_BUF_SIZE.name(), receive, 1);
    violations.at_least(keys::SO_BACK_LOG_SIZE.name(), backlog, 1);

    Ok(SocketBuffers {
        send_buffer_bytes: to_usize(send),
        receive_buffer_bytes: to_usize(receive),
        backlog: to_usize(backlog),
    })
}

/// Resolve the watermark pair, recording inverted or negative marks.
pub fn resolve_watermarks(
    scope: &Scope<'_>,
    violations: &mut Violations,
) -> ConfigResult<WatermarkPair> {
    let high = scope.resolve(
        &keys::WRITE_BUFFER_HIGH_WATER_MARK,
        defaults::WRITE_BUFFER_HIGH_WATER_MARK,
    )?;
    let low = scope.resolve(
        &keys::WRITE_BUFFER_LOW_WATER_MARK,
        defaults::WRITE_BUFFER_LOW_WATER_MARK,
    )?;

    violations.at_least(keys::WRITE_BUFFER_LOW_WATER_MARK.name(), low, 0);
    violations.watermarks(high, low);

    Ok(WatermarkPair {
        high_watermark_bytes: to_usize(high),
        low_watermark_bytes: to_usize(low),
    })
}

fn to_usize(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}
