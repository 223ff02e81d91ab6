//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once for the binary
//! - Honour `RUST_LOG`, falling back to a caller-supplied directive
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - Writes to stderr so stdout stays machine-readable

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(level: &str) -> String {
    format!("tc_transport_config={level}")
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_crate() {
        assert_eq!(default_directive("debug"), "tc_transport_config=debug");
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_logging("warn");
        init_logging("info");
    }
}
