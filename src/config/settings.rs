//! # Configuration Settings
//!
//! Defines the configuration structure for a migration run.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use validator::Validate;

use crate::destination::SsmConfig;
use crate::errors::{MigrationError, Result};
use crate::migration::{parse_selectors, MigrationConfig};
use crate::observability::{LogFormat, LoggingConfig};
use crate::source::{SecretString, VaultConfig};

/// Environment variables read on top of the configuration file.
pub mod env {
    pub const VAULT_ADDR: &str = "VAULT_ADDR";
    pub const VAULT_TOKEN: &str = "VAULT_TOKEN";
    pub const VAULT_NAMESPACE: &str = "VAULT_NAMESPACE";
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const AWS_PROFILE: &str = "AWS_PROFILE";
    pub const SSM_ENDPOINT: &str = "VAULT_TO_SSM_SSM_ENDPOINT";
    pub const MOUNTS: &str = "VAULT_TO_SSM_MOUNTS";
    pub const MAX_DEPTH: &str = "VAULT_TO_SSM_MAX_DEPTH";
    pub const MOUNT_CONCURRENCY: &str = "VAULT_TO_SSM_MOUNT_CONCURRENCY";
    pub const PUBLISH_CONCURRENCY: &str = "VAULT_TO_SSM_PUBLISH_CONCURRENCY";
    pub const DRY_RUN: &str = "VAULT_TO_SSM_DRY_RUN";
    pub const LOG_FORMAT: &str = "VAULT_TO_SSM_LOG_FORMAT";
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Vault source configuration
    #[validate(nested)]
    pub vault: VaultConfig,

    /// SSM destination configuration
    #[validate(nested)]
    pub ssm: SsmConfig,

    /// Run settings
    #[validate(nested)]
    pub migration: MigrationConfig,

    #[validate(nested)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(MigrationError::from)?;
        self.validate_custom()?;
        Ok(())
    }

    fn validate_custom(&self) -> Result<()> {
        if self.vault.token.as_ref().is_some_and(SecretString::is_empty) {
            return Err(MigrationError::config("Vault token cannot be empty"));
        }

        // Malformed selectors fail here, before anything contacts Vault.
        parse_selectors(&self.migration.mounts)?;

        Ok(())
    }

    /// Overlay the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; unset and empty variables are ignored.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Configuration`] if a variable holds an unparsable value
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(address) = get(env::VAULT_ADDR) {
            self.vault.address = address;
        }
        if let Some(token) = get(env::VAULT_TOKEN) {
            self.vault.token = Some(SecretString::new(token));
        }
        if let Some(namespace) = get(env::VAULT_NAMESPACE) {
            self.vault.namespace = Some(namespace);
        }

        if let Some(region) = get(env::AWS_REGION) {
            self.ssm.region = Some(region);
        }
        if let Some(profile) = get(env::AWS_PROFILE) {
            self.ssm.profile = Some(profile);
        }
        if let Some(endpoint) = get(env::SSM_ENDPOINT) {
            self.ssm.endpoint_url = Some(endpoint);
        }

        if let Some(mounts) = get(env::MOUNTS) {
            self.migration.mounts = split_list(&mounts);
        }
        if let Some(value) = get(env::MAX_DEPTH) {
            self.migration.max_depth = parse_env(env::MAX_DEPTH, &value)?;
        }
        if let Some(value) = get(env::MOUNT_CONCURRENCY) {
            self.migration.mount_concurrency = parse_env(env::MOUNT_CONCURRENCY, &value)?;
        }
        if let Some(value) = get(env::PUBLISH_CONCURRENCY) {
            self.migration.publish_concurrency = parse_env(env::PUBLISH_CONCURRENCY, &value)?;
        }
        if let Some(value) = get(env::DRY_RUN) {
            self.migration.dry_run = parse_bool(env::DRY_RUN, &value)?;
        }

        if let Some(value) = get(env::LOG_FORMAT) {
            self.logging.format = LogFormat::from_str(&value)?;
        }

        Ok(())
    }
}

/// Split a comma-separated list, dropping blank items.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| {
        MigrationError::config(format!("Invalid value for {}: '{}' ({})", name, value, e))
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MigrationError::config(format!(
            "Invalid value for {}: '{}' (expected true or false)",
            name, value
        ))),
    }
}
