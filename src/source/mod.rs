//! Source side of the migration: a hierarchical KV secret store.
//!
//! The [`SecretSource`] trait is the boundary to the secret store. It only needs an
//! already-authenticated handle and exposes the three operations discovery and the walk
//! require:
//! - **list_mounts**: enumerate mount points with their engine type and options
//! - **list_children**: list the direct children of an interior node
//! - **read_secret**: fetch the payload stored at a leaf
//!
//! Both list and read are parameterized by the mount's [`KvVersion`], which is decided
//! once per mount and never re-derived during its walk.
//!
//! # Backends
//!
//! - **HashiCorp Vault** ([`VaultSource`]): KV v1, KV v2 and the legacy `generic` engine
//! - **In-memory** ([`InMemorySource`]): a fixture-backed store for tests

pub mod memory;
pub mod types;
pub mod vault;

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::Result;

pub use memory::InMemorySource;
pub use types::{
    normalize_mount_id, KvVersion, Mount, MountInfo, SecretPath, SecretPayload, SecretString,
    SEPARATOR,
};
pub use vault::{VaultConfig, VaultSource};

/// Read-only access to a hierarchical secret store.
///
/// # Contract
///
/// - `list_children` returns names relative to `path`; a name ending in `/` is an
///   interior node, anything else is a leaf.
/// - `read_secret` returns `Ok(None)` when the leaf holds no data. That is not an error.
/// - Errors carry the offending path.
/// - Implementations MUST NOT log secret values.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Enumerate all mount points visible to the current credentials.
    ///
    /// Keys are mount paths as reported by the store (they may carry a trailing `/`).
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>>;

    /// List the direct children of an interior node.
    async fn list_children(&self, path: &SecretPath, version: KvVersion) -> Result<Vec<String>>;

    /// Fetch the payload of a leaf.
    async fn read_secret(
        &self,
        path: &SecretPath,
        version: KvVersion,
    ) -> Result<Option<SecretPayload>>;
}

#[async_trait]
impl<S: SecretSource + ?Sized> SecretSource for std::sync::Arc<S> {
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>> {
        (**self).list_mounts().await
    }

    async fn list_children(&self, path: &SecretPath, version: KvVersion) -> Result<Vec<String>> {
        (**self).list_children(path, version).await
    }

    async fn read_secret(
        &self,
        path: &SecretPath,
        version: KvVersion,
    ) -> Result<Option<SecretPayload>> {
        (**self).read_secret(path, version).await
    }
}
