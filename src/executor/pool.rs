//! Thread pool bounds handed to the external pool manager.

use std::time::Duration;

use serde::Serialize;

use crate::config::validation::Violations;

/// Bounds for one worker pool.
///
/// `min_threads <= max_threads` holds for every spec produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadPoolSpec {
    /// Thread-name prefix for the pool's threads.
    pub name: String,
    pub min_threads: usize,
    pub max_threads: usize,
    /// Tasks queued before the pool manager starts rejecting.
    pub queue_capacity: usize,
    /// Idle time before threads above `min_threads` are retired.
    pub keep_alive_millis: u64,
}

impl ThreadPoolSpec {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_millis)
    }

    /// Fixed-size pool: never grows or shrinks.
    pub fn is_pinned(&self) -> bool {
        self.min_threads == self.max_threads
    }
}

/// How a pool's thread bounds are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SizingMode {
    /// min == max == the pinned thread count.
    Pinned,
    /// Grows from `min` toward `max` under load.
    Elastic { min: i32, max: i32 },
}

impl SizingMode {
    /// Concrete `(min, max)` for this mode.
    pub fn bounds(&self, pinned_threads: usize) -> (i32, i32) {
        match *self {
            SizingMode::Pinned => {
                let n = i32::try_from(pinned_threads).unwrap_or(i32::MAX);
                (n, n)
            }
            SizingMode::Elastic { min, max } => (min, max),
        }
    }

    /// Turn this mode into a spec, recording any bound violation.
    pub fn into_spec(
        self,
        pool: PoolLimits,
        pinned_threads: usize,
        violations: &mut Violations,
    ) -> ThreadPoolSpec {
        let (min, max) = self.bounds(pinned_threads);

        violations.at_least(pool.min_key, min, 0);
        violations.at_least(pool.max_key, max, 1);
        violations.ordered_bounds(pool.name, min, max);

        ThreadPoolSpec {
            name: pool.thread_name.to_string(),
            min_threads: to_usize(min),
            max_threads: to_usize(max),
            queue_capacity: to_usize(pool.queue_capacity),
            keep_alive_millis: u64::try_from(pool.keep_alive_millis).unwrap_or(0),
        }
    }
}

/// Non-bound settings of a pool plus the keys its bounds came from.
///
/// Queue capacity and keep-alive are shared by both pools and checked once by
/// the sizer.
#[derive(Debug, Clone, Copy)]
pub struct PoolLimits {
    pub name: &'static str,
    pub thread_name: &'static str,
    pub min_key: &'static str,
    pub max_key: &'static str,
    pub queue_capacity: i32,
    pub keep_alive_millis: i32,
}

fn to_usize(v: i32) -> usize {
    usize::try_from(v).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PoolLimits {
        PoolLimits {
            name: "test",
            thread_name: "TestThread",
            min_key: "min",
            max_key: "max",
            queue_capacity: 10,
            keep_alive_millis: 500,
        }
    }

    #[test]
    fn pinned_mode_uses_same_bound_twice() {
        let mut v = Violations::new();
        let spec = SizingMode::Pinned.into_spec(limits(), 6, &mut v);
        assert!(v.is_empty());
        assert_eq!((spec.min_threads, spec.max_threads), (6, 6));
        assert!(spec.is_pinned());
        assert_eq!(spec.keep_alive(), Duration::from_millis(500));
    }

    #[test]
    fn elastic_mode_keeps_its_bounds() {
        let mut v = Violations::new();
        let spec = SizingMode::Elastic { min: 2, max: 9 }.into_spec(limits(), 6, &mut v);
        assert!(v.is_empty());
        assert_eq!((spec.min_threads, spec.max_threads), (2, 9));
        assert!(!spec.is_pinned());
    }

    #[test]
    fn inverted_bounds_are_recorded() {
        let mut v = Violations::new();
        SizingMode::Elastic { min: 9, max: 2 }.into_spec(limits(), 6, &mut v);
        assert_eq!(v.into_errors().len(), 1);
    }

    #[test]
    fn out_of_range_bounds_are_recorded() {
        let mut v = Violations::new();
        SizingMode::Elastic { min: -1, max: 0 }.into_spec(limits(), 6, &mut v);
        assert_eq!(v.into_errors().len(), 2);
    }
}
