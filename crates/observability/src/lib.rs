//! Tracing/logging setup shared by every Larder binary.

/// Initialize process-wide tracing with the format from `LARDER_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Tracing configuration (filters, output format).
pub mod tracing;
