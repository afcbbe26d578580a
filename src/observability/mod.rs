//! # Observability
//!
//! Structured logging for migration runs. Every run is wrapped in a `migration_run`
//! span and every mount walk in a `mount_walk` span.

pub mod logging;

pub use logging::{build_filter, init_logging, log_config_info, LogFormat, LoggingConfig};
