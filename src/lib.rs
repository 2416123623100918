/// Configuration management
pub mod config;

/// HTTP client with status-code retries
pub mod client;

/// Upstream height sources (Bor, Heimdall, staking API)
pub mod sources;

/// The poll-extract-publish loop
pub mod exporter;

/// Application telemetry, logging and metrics
pub mod telemetry;

/// Build version information
pub mod version;
