//! In-memory secret store.
//!
//! Holds mounts and leaf payloads in process memory and derives listings from the stored
//! leaf paths, the same way Vault does. Failures can be injected per path so that walk and
//! abort behavior can be exercised without a live server.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use super::types::{
    normalize_mount_id, KvVersion, MountInfo, SecretPath, SecretPayload, SEPARATOR,
};
use super::SecretSource;
use crate::errors::{MigrationError, Result};

/// Fixture-backed [`SecretSource`].
#[derive(Debug, Default)]
pub struct InMemorySource {
    mounts: HashMap<String, MountInfo>,
    /// Leaf key (`mount/relative`) to payload; `None` stores a leaf with no data
    leaves: BTreeMap<String, Option<SecretPayload>>,
    /// Interior keys whose listing is replaced verbatim
    listing_overrides: HashMap<String, Vec<String>>,
    failing_lists: BTreeSet<String>,
    failing_reads: BTreeSet<String>,
    deny_mount_listing: bool,
    reads: Mutex<Vec<String>>,
    /// Every list and read as `(key, variant)`, in call order
    calls: Mutex<Vec<(String, KvVersion)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mount as the store would report it (e.g. `"secret/"`).
    pub fn with_mount(mut self, path: impl Into<String>, info: MountInfo) -> Self {
        self.mounts.insert(path.into(), info);
        self
    }

    /// Store a payload at a full leaf key such as `secret/app/db`.
    pub fn with_secret(mut self, key: impl Into<String>, payload: SecretPayload) -> Self {
        self.leaves.insert(key.into(), Some(payload));
        self
    }

    /// Store a leaf that is listed but reads back with no data.
    pub fn with_empty_secret(mut self, key: impl Into<String>) -> Self {
        self.leaves.insert(key.into(), None);
        self
    }

    /// Replace the listing of an interior key (e.g. `kv/sub/`) with fixed names.
    pub fn with_listing(mut self, key: impl Into<String>, names: Vec<String>) -> Self {
        self.listing_overrides.insert(key.into(), names);
        self
    }

    /// Make listing the given interior key fail with a transport error.
    pub fn fail_listing(mut self, key: impl Into<String>) -> Self {
        self.failing_lists.insert(key.into());
        self
    }

    /// Make reading the given leaf key fail with a transport error.
    pub fn fail_read(mut self, key: impl Into<String>) -> Self {
        self.failing_reads.insert(key.into());
        self
    }

    /// Make mount discovery fail as if the token lacked permission.
    pub fn deny_mount_listing(mut self) -> Self {
        self.deny_mount_listing = true;
        self
    }

    /// Leaf keys read so far, in call order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().map(|reads| reads.clone()).unwrap_or_default()
    }

    /// Keys listed or read so far with the protocol variant each call carried.
    pub fn calls(&self) -> Vec<(String, KvVersion)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, key: &str, version: KvVersion) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((key.to_string(), version));
        }
    }

    fn derived_children(&self, dir_key: &str) -> Vec<String> {
        let mut children = BTreeSet::new();
        for key in self.leaves.keys() {
            let Some(rest) = key.strip_prefix(dir_key) else {
                continue;
            };
            match rest.find(SEPARATOR) {
                Some(idx) => children.insert(rest[..=idx].to_string()),
                None if !rest.is_empty() => children.insert(rest.to_string()),
                None => false,
            };
        }
        children.into_iter().collect()
    }

    fn mount_is_known(&self, mount: &str) -> bool {
        self.mounts.keys().any(|path| normalize_mount_id(path) == mount)
    }
}

#[async_trait]
impl SecretSource for InMemorySource {
    async fn list_mounts(&self) -> Result<HashMap<String, MountInfo>> {
        if self.deny_mount_listing {
            return Err(MigrationError::access("permission denied listing sys/mounts"));
        }
        Ok(self.mounts.clone())
    }

    async fn list_children(&self, path: &SecretPath, version: KvVersion) -> Result<Vec<String>> {
        let key = path.key();
        self.record(&key, version);
        if self.failing_lists.contains(&key) {
            return Err(MigrationError::transport(key, "injected listing failure"));
        }
        if let Some(names) = self.listing_overrides.get(&key) {
            return Ok(names.clone());
        }
        if !self.mount_is_known(path.mount()) && path.relative().is_empty() {
            return Err(MigrationError::not_found(key));
        }
        Ok(self.derived_children(&key))
    }

    async fn read_secret(
        &self,
        path: &SecretPath,
        version: KvVersion,
    ) -> Result<Option<SecretPayload>> {
        let key = path.key();
        self.record(&key, version);
        if let Ok(mut reads) = self.reads.lock() {
            reads.push(key.clone());
        }
        if self.failing_reads.contains(&key) {
            return Err(MigrationError::transport(key, "injected read failure"));
        }
        match self.leaves.get(&key) {
            Some(payload) => Ok(payload.clone()),
            None => Err(MigrationError::not_found(key)),
        }
    }
}
