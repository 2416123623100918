//! Telemetry module
//!
//! This module encompasses telemetry and logging.
//! Core components are described below.
//!
//! ### Logging
//!
//! Logging is constructed using the [tracing](https://crates.io/crates/tracing) crate.
//! The `tracing` crate is a framework for instrumenting Rust programs to collect
//! structured, event-based diagnostic information. You can use the [crate::telemetry::init] function
//! to initialize a global logger, passing in a boolean `verbose` parameter and an optional
//! logs directory. This function will return an error if a logger has already been initialized.
//!
//! ### Metrics
//!
//! Metrics are collected using the [prometheus](https://crates.io/crates/prometheus) crate.
//! Gauges live in an explicitly constructed registry that is handed both to the
//! poll loop and to the scrape server started by [crate::telemetry::init_metrics].

pub mod logging;
pub use logging::{
    build_subscriber, get_rolling_file_appender, with_report_directive, get_rotation_strategy, init, AnsiTermLayer,
    AnsiVisitor, DEFAULT_ROTATION, LOG_FILE_NAME_PREFIX, REPORT_TARGET,
};

pub mod metrics;
pub use metrics::{init as init_metrics, publish_height, render, Metrics, ENDPOINT_LABEL};

mod shutdown;
pub use shutdown::register_shutdown;

