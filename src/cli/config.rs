//! Command line overrides for the configuration layers.
//!
//! Flags are the highest-priority layer: the file and environment are resolved first
//! (see [`crate::config::load`]), then every flag that was given replaces the value
//! underneath it, and only then is the result validated.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use tracing::debug;

use crate::config::AppConfig;
use crate::destination::SsmConfig;
use crate::migration::MountErrorPolicy;
use crate::observability::LogFormat;
use crate::source::{SecretString, VaultConfig};

/// Vault connection flags
#[derive(Debug, Clone, Default, Args)]
pub struct VaultArgs {
    /// Vault server address
    #[arg(long, value_name = "URL")]
    pub vault_addr: Option<String>,

    /// Vault token (prefer VAULT_TOKEN to keep it out of shell history)
    #[arg(long, value_name = "TOKEN")]
    pub vault_token: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, value_name = "NAMESPACE")]
    pub vault_namespace: Option<String>,
}

impl VaultArgs {
    pub fn apply(&self, config: &mut VaultConfig) {
        if let Some(ref address) = self.vault_addr {
            debug!("Using Vault address from --vault-addr");
            config.address = address.clone();
        }
        if let Some(ref token) = self.vault_token {
            debug!("Using Vault token from --vault-token");
            config.token = Some(SecretString::new(token.clone()));
        }
        if let Some(ref namespace) = self.vault_namespace {
            config.namespace = Some(namespace.clone());
        }
    }
}

/// Parameter Store flags
#[derive(Debug, Clone, Default, Args)]
pub struct SsmArgs {
    /// AWS region for Parameter Store
    #[arg(long, value_name = "REGION")]
    pub aws_region: Option<String>,

    /// Named AWS profile
    #[arg(long, value_name = "PROFILE")]
    pub aws_profile: Option<String>,

    /// Parameter Store endpoint override (e.g. a local emulator)
    #[arg(long, value_name = "URL")]
    pub ssm_endpoint: Option<String>,

    /// Fail writes for parameters that already exist instead of replacing them
    #[arg(long)]
    pub no_overwrite: bool,
}

impl SsmArgs {
    pub fn apply(&self, config: &mut SsmConfig) {
        if let Some(ref region) = self.aws_region {
            config.region = Some(region.clone());
        }
        if let Some(ref profile) = self.aws_profile {
            config.profile = Some(profile.clone());
        }
        if let Some(ref endpoint) = self.ssm_endpoint {
            config.endpoint_url = Some(endpoint.clone());
        }
        if self.no_overwrite {
            config.overwrite = false;
        }
    }
}

/// Run-shaping flags of `migrate`
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Migrate only this mount; `<mount>` or `<mount>=<kv1|kv2>` (repeatable)
    #[arg(long = "mount", value_name = "SELECTOR")]
    pub mounts: Vec<String>,

    /// Maximum directory depth below a mount root
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Mounts walked concurrently
    #[arg(long, value_name = "N")]
    pub mount_concurrency: Option<usize>,

    /// Parameter writes in flight
    #[arg(long, value_name = "N")]
    pub publish_concurrency: Option<usize>,

    /// Record failed mounts and continue with the rest
    #[arg(long)]
    pub skip_failed_mounts: bool,

    /// Walk and aggregate without writing to Parameter Store
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero if any parameter write fails
    #[arg(long)]
    pub strict: bool,
}

impl RunArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        let migration = &mut config.migration;

        if !self.mounts.is_empty() {
            migration.mounts = self.mounts.clone();
        }
        if let Some(depth) = self.max_depth {
            migration.max_depth = depth;
        }
        if let Some(n) = self.mount_concurrency {
            migration.mount_concurrency = n;
        }
        if let Some(n) = self.publish_concurrency {
            migration.publish_concurrency = n;
        }
        if self.skip_failed_mounts {
            migration.on_mount_error = MountErrorPolicy::Skip;
        }
        if self.dry_run {
            migration.dry_run = true;
        }
        if self.strict {
            migration.fail_on_publish_error = true;
        }
    }
}

/// Load file and environment layers, apply `overrides`, then validate.
pub fn resolve_config<F>(
    path: Option<&Path>,
    log_format: Option<LogFormat>,
    overrides: F,
) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = crate::config::load(path).context("Failed to load configuration")?;

    overrides(&mut config);
    if let Some(format) = log_format {
        config.logging.format = format;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
