//! AWS Systems Manager Parameter Store destination.
//!
//! Session, region and credential resolution are delegated to `aws-config`'s default
//! provider chain; the settings here only pin what the operator asked for explicitly.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::error::DisplayErrorContext;
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::{ParameterStore, ParameterType};
use crate::errors::{MigrationError, Result};

/// Configuration for the SSM destination.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SsmConfig {
    /// AWS region (falls back to the default provider chain when unset)
    #[validate(length(min = 1, message = "Region cannot be empty"))]
    pub region: Option<String>,

    /// Named profile from the shared AWS config/credentials files
    pub profile: Option<String>,

    /// Endpoint override, e.g. a local SSM emulator
    #[validate(url(message = "Endpoint must be a valid URL"))]
    pub endpoint_url: Option<String>,

    /// Replace parameters that already exist
    pub overwrite: bool,
}

impl Default for SsmConfig {
    fn default() -> Self {
        Self { region: None, profile: None, endpoint_url: None, overwrite: true }
    }
}

/// SSM-backed [`ParameterStore`].
#[derive(Debug, Clone)]
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
    overwrite: bool,
}

impl SsmParameterStore {
    /// Resolve AWS configuration and build a client.
    pub async fn from_config(config: &SsmConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(ref profile) = config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        debug!(
            region = ?shared.region().map(|r| r.to_string()),
            profile = ?config.profile,
            overwrite = config.overwrite,
            "Resolved AWS configuration for SSM"
        );

        Self::with_client(aws_sdk_ssm::Client::new(&shared), config.overwrite)
    }

    /// Wrap an existing SDK client.
    pub fn with_client(client: aws_sdk_ssm::Client, overwrite: bool) -> Self {
        Self { client, overwrite }
    }
}

fn sdk_parameter_type(kind: ParameterType) -> aws_sdk_ssm::types::ParameterType {
    match kind {
        ParameterType::String => aws_sdk_ssm::types::ParameterType::String,
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(sdk_parameter_type(kind))
            .overwrite(self.overwrite)
            .send()
            .await
            .map_err(|e| MigrationError::write(name, DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssm_config_default() {
        let config = SsmConfig::default();
        assert!(config.region.is_none());
        assert!(config.profile.is_none());
        assert!(config.endpoint_url.is_none());
        assert!(config.overwrite);
    }

    #[test]
    fn test_ssm_config_validation() {
        let config = SsmConfig {
            region: Some("eu-west-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let bad = SsmConfig { endpoint_url: Some("not a url".to_string()), ..Default::default() };
        assert!(bad.validate().is_err());

        let empty_region = SsmConfig { region: Some(String::new()), ..Default::default() };
        assert!(empty_region.validate().is_err());
    }

    #[test]
    fn test_parameter_type_mapping() {
        assert_eq!(
            sdk_parameter_type(ParameterType::String),
            aws_sdk_ssm::types::ParameterType::String
        );
    }

    #[tokio::test]
    async fn test_from_config_with_explicit_region() {
        let config = SsmConfig {
            region: Some("us-east-1".to_string()),
            endpoint_url: Some("http://localhost:4566".to_string()),
            overwrite: false,
            ..Default::default()
        };
        let store = SsmParameterStore::from_config(&config).await;
        assert!(!store.overwrite);
    }
}
