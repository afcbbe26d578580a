//! # Structured Logging
//!
//! Subscriber setup and span macros for migration runs.
//!
//! Logs go to stderr so that command output on stdout stays machine readable. In JSON
//! mode every event carries the enclosing `migration_run` and `mount_walk` span fields,
//! which makes it possible to filter one run or one mount out of an aggregated log stream.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::{MigrationError, Result};

/// Create the root span of a migration run.
///
/// ```rust,ignore
/// let span = run_span!(uuid::Uuid::new_v4(), false);
/// ```
#[macro_export]
macro_rules! run_span {
    ($run_id:expr, $dry_run:expr) => {
        tracing::info_span!("migration_run", run_id = %$run_id, dry_run = $dry_run)
    };
}

/// Create a span for one mount walk.
///
/// ```rust,ignore
/// let span = mount_span!("secret", KvVersion::V1);
/// let span = mount_span!("secret", KvVersion::V1, attempt = 2);
/// ```
#[macro_export]
macro_rules! mount_span {
    ($mount:expr, $version:expr) => {
        tracing::info_span!(
            "mount_walk",
            mount = %$mount,
            version = %$version,
            walk_id = %uuid::Uuid::new_v4()
        )
    };
    ($mount:expr, $version:expr, $($field:tt)*) => {
        tracing::info_span!(
            "mount_walk",
            mount = %$mount,
            version = %$version,
            walk_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, one line per event
    #[default]
    Pretty,
    /// One JSON object per event, including span fields
    Json,
}

impl FromStr for LogFormat {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(MigrationError::config(format!(
                "Unsupported log format: '{}'. Use 'pretty' or 'json'.",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub level: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

/// Build the event filter. `RUST_LOG` wins over the configured level; `verbose` raises
/// the configured level to `debug`.
pub fn build_filter(config: &LoggingConfig, verbose: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = if verbose { "debug" } else { config.level.as_str() };
    EnvFilter::try_new(directive).map_err(|e| {
        let message = format!("Invalid log level '{}'", directive);
        MigrationError::config_with_source(message, Box::new(e))
    })
}

/// Install the global subscriber.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let filter = build_filter(config, verbose)?;

    let installed = match config.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .finish(),
        ),
    };

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = installed;
    Ok(())
}

/// Log the effective configuration at startup. The Vault token is never logged.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        vault_address = %config.vault.address,
        vault_namespace = ?config.vault.namespace,
        vault_token_set = config.vault.token.is_some(),
        aws_region = ?config.ssm.region,
        aws_profile = ?config.ssm.profile,
        ssm_endpoint = ?config.ssm.endpoint_url,
        overwrite = config.ssm.overwrite,
        mounts = ?config.migration.mounts,
        max_depth = config.migration.max_depth,
        mount_concurrency = config.migration.mount_concurrency,
        publish_concurrency = config.migration.publish_concurrency,
        on_mount_error = ?config.migration.on_mount_error,
        dry_run = config.migration.dry_run,
        "vault-to-ssm configuration"
    );
}
