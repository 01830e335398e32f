//! Tracing and logging setup shared by the binaries.

/// Initialize process-wide logging with the default `info` filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Subscriber configuration (filters, JSON formatting).
pub mod tracing;
