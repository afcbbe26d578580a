//! HashiCorp Vault source backend.
//!
//! Reads from KV v1 (and the legacy `generic` engine) and KV v2 mounts using `vaultrs`.
//!
//! # Configuration
//!
//! - Vault server address (HTTPS recommended)
//! - Authentication token (session bootstrap beyond a static token is out of scope)
//! - Optional namespace for Enterprise multi-tenancy
//!
//! # Protocol mapping
//!
//! | Variant | List                       | Read                         |
//! |---------|----------------------------|------------------------------|
//! | `kv1`   | `LIST /v1/{mount}/{path}`  | `GET /v1/{mount}/{path}`     |
//! | `kv2`   | `LIST /v1/{mount}/metadata/{path}` | `GET /v1/{mount}/data/{path}` |
//!
//! Vault answers a LIST on a prefix with no keys with `404`; that is reported as an
//! empty listing rather than an error.
//!
//! A KV v2 key whose latest version is deleted or destroyed is still listed, and reading
//! it returns `404` with the version metadata in the body. That read yields no data, the
//! same as an empty secret. A `404` without a body stays [`MigrationError::NotFound`].

use async_trait::async_trait;
use rustify::errors::ClientError as RestError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use validator::Validate;
use vaultrs::{kv1, kv2};

use super::types::{KvVersion, MountInfo, SecretPath, SecretPayload, SecretString};
use super::SecretSource;
use crate::errors::{MigrationError, Result};

/// Configuration for the Vault source.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    #[validate(url(message = "Vault address must be a valid URL"))]
    pub address: String,

    /// Vault authentication token
    pub token: Option<SecretString>,

    /// Vault namespace (for Enterprise multi-tenancy)
    pub namespace: Option<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { address: "http://127.0.0.1:8200".to_string(), token: None, namespace: None }
    }
}

/// Vault-backed [`SecretSource`].
pub struct VaultSource {
    client: VaultClient,
    address: String,
}

impl std::fmt::Debug for VaultSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSource")
            .field("address", &self.address)
            .field("client", &"[VaultClient]")
            .finish()
    }
}

impl VaultSource {
    /// Build a client without contacting Vault.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Configuration`] if the address or token is missing, or the
    ///   settings are invalid
    pub fn new(config: &VaultConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(MigrationError::config("Vault address cannot be empty"));
        }
        if !config.token.as_ref().is_some_and(|t| !t.is_empty()) {
            return Err(MigrationError::config(
                "Vault token is required (set VAULT_TOKEN or pass --vault-token)",
            ));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token.expose_secret());
        }

        if let Some(ref namespace) = config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            MigrationError::config(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings)
            .map_err(|e| MigrationError::config(format!("Failed to create Vault client: {}", e)))?;

        Ok(Self { client, address: config.address.clone() })
    }

    /// Build a client and verify Vault is reachable.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Configuration`] if the configuration is invalid
    /// - [`MigrationError::Transport`] if the health check fails
    pub async fn connect(config: &VaultConfig) -> Result<Self> {
        let source = Self::new(config)?;

        vaultrs::sys::health(&source.client).await.map_err(|e| {
            tracing::error!(error = %e, address = %config.address, "Failed to connect to Vault");
            MigrationError::transport(&config.address, format!("Vault health check failed: {}", e))
        })?;

        info!(address = %config.address, "Successfully connected to Vault");
        Ok(source)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn read_v2(
        &self,
        path: &SecretPath,
    ) -> std::result::Result<Option<SecretPayload>, ClientError> {
        match kv2::read(&self.client, path.mount(), path.relative()).await {
            Err(e) if is_deleted_version(&e) => {
                debug!(path = %path, "Latest version is deleted, skipping");
                Ok(None)
            }
            other => other,
        }
    }
}

/// Map a `vaultrs` failure on `path` onto the migration error taxonomy.
fn map_client_error(path: &SecretPath, error: ClientError) -> MigrationError {
    match error {
        e if is_not_found(&e) => MigrationError::not_found(path.key()),
        ClientError::APIError { code: 403, errors } => MigrationError::access(format!(
            "permission denied at {}: {}",
            path,
            errors.join(", ")
        )),
        other => MigrationError::transport(path.key(), other.to_string()),
    }
}

/// A `404` surfaces as `APIError` when the body carries `errors`, otherwise as the raw
/// server response.
fn is_not_found(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::APIError { code: 404, .. }
            | ClientError::RestClientError {
                source: RestError::ServerResponseError { code: 404, .. }
            }
    )
}

/// True when a KV v2 read failed only because the latest version is deleted or destroyed.
fn is_deleted_version(error: &ClientError) -> bool {
    let ClientError::RestClientError {
        source: RestError::ServerResponseError { code: 404, content: Some(body) },
    } = error
    else {
        return false;
    };

    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|body| body.pointer("/data/metadata").map(serde_json::Value::is_object))
        .unwrap_or(false)
}

#[async_trait]
impl SecretSource for VaultSource {
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>> {
        let mounts = vaultrs::sys::mount::list(&self.client).await.map_err(|e| match e {
            ClientError::APIError { code: 403, .. } => {
                MigrationError::access("token is not permitted to list mounts (sys/mounts)")
            }
            other => MigrationError::transport("sys/mounts", other.to_string()),
        })?;

        debug!(count = mounts.len(), "Listed Vault mounts");

        Ok(mounts
            .into_iter()
            .map(|(path, mount)| {
                let info = MountInfo {
                    kind: mount.mount_type,
                    options: mount.options.unwrap_or_default(),
                };
                (path, info)
            })
            .collect())
    }

    async fn list_children(&self, path: &SecretPath, version: KvVersion) -> Result<Vec<String>> {
        let listed = match version {
            KvVersion::V1 => kv1::list(&self.client, path.mount(), path.relative())
                .await
                .map(|response| response.data.keys),
            KvVersion::V2 => kv2::list(&self.client, path.mount(), path.relative()).await,
        };

        match listed {
            Ok(keys) => Ok(keys),
            Err(e) if is_not_found(&e) => {
                debug!(path = %path, "Empty listing");
                Ok(Vec::new())
            }
            Err(e) => Err(map_client_error(path, e)),
        }
    }

    async fn read_secret(
        &self,
        path: &SecretPath,
        version: KvVersion,
    ) -> Result<Option<SecretPayload>> {
        let data = match version {
            KvVersion::V1 => {
                kv1::get::<Option<SecretPayload>>(&self.client, path.mount(), path.relative()).await
            }
            KvVersion::V2 => self.read_v2(path).await,
        }
        .map_err(|e| map_client_error(path, e))?;

        Ok(data.filter(|payload| !payload.is_empty()))
    }
}
