//! Tracing/logging initialization.
//!
//! Logs are JSON lines with timestamps. `RUST_LOG` overrides the fallback
//! filter; an unparsable `RUST_LOG` is ignored rather than fatal.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Install the JSON subscriber. Returns `false` if one was already installed.
pub fn init(fallback: &str) -> bool {
    let filter = filter_from(std::env::var("RUST_LOG").ok().as_deref(), fallback);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init()
        .is_ok()
}

/// Resolve the filter from an optional directive string, falling back to
/// `fallback` (and then to [`DEFAULT_FILTER`]) when it is absent or invalid.
pub fn filter_from(directives: Option<&str>, fallback: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
