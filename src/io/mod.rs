//! Error handling, configuration and reporting collaborators

/// Statistic constants and runtime configuration
pub mod configuration;
/// Error types and per-lag context
pub mod error;
/// Progress display over lags
pub mod progress;
/// Injectable rendering of pipeline results
pub mod visualization;
