//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of resolved values (parsing handles syntax)
//! - Pool bounds: min <= max
//! - Watermark ordering: high > low
//! - Value ranges: sizes and counts positive, timeouts non-negative
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Violations are rejected, never clamped
//! - Runs before a snapshot is handed to the transport bootstrap

use thiserror::Error;

use crate::config::error::{ConfigError, ConfigResult};

/// A resolved value that violates an invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Pool minimum exceeds its maximum.
    #[error("{pool} pool bounds inverted: min={min} > max={max}")]
    PoolBounds { pool: &'static str, min: i32, max: i32 },

    /// High watermark not strictly above the low watermark.
    #[error("write buffer watermarks inverted: high={high} must exceed low={low}")]
    Watermarks { high: i32, low: i32 },

    /// Value below the smallest accepted value for its key.
    #[error("{key}={value} is below the minimum of {min}")]
    Range { key: &'static str, value: i64, min: i64 },
}

/// Accumulates violations across a whole snapshot.
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<ValidationError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record a violation when `value < min`.
    pub fn at_least(&mut self, key: &'static str, value: impl Into<i64>, min: i64) {
        let value = value.into();
        if value < min {
            self.push(ValidationError::Range { key, value, min });
        }
    }

    /// Record a violation when `min > max`.
    pub fn ordered_bounds(&mut self, pool: &'static str, min: i32, max: i32) {
        if min > max {
            self.push(ValidationError::PoolBounds { pool, min, max });
        }
    }

    /// Record a violation when `high <= low`.
    pub fn watermarks(&mut self, high: i32, low: i32) {
        if high <= low {
            self.push(ValidationError::Watermarks { high, low });
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// `Ok` when nothing was recorded, otherwise every violation at once.
    pub fn into_result(self) -> ConfigResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            for err in &self.errors {
                tracing::error!(error = %err, "Invalid transport configuration");
            }
            Err(ConfigError::Validation(self.errors))
        }
    }
}
