//! Recursive walk over one mount's tree.
//!
//! Children are processed one at a time in listing order. Interior nodes (names ending in
//! `/`) are descended into; every other name is read and flattened. The first listing,
//! read or serialization failure aborts the walk and nothing from the mount is returned.

use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use super::normalizer::normalize;
use crate::errors::{MigrationError, Result};
use crate::source::{Mount, SecretPath, SecretSource};

/// Default bound on interior levels below a mount root
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Flat entries collected from one mount: full leaf path to flat value.
pub type MountEntries = BTreeMap<String, String>;

/// Walks a single mount with the variant fixed at construction.
pub struct TreeWalker<'a, S: SecretSource + ?Sized> {
    source: &'a S,
    mount: &'a Mount,
    max_depth: usize,
}

impl<'a, S: SecretSource + ?Sized> TreeWalker<'a, S> {
    pub fn new(source: &'a S, mount: &'a Mount, max_depth: usize) -> Self {
        Self { source, mount, max_depth }
    }

    /// Walk the whole mount and return its flat entries.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Transport`] / [`MigrationError::NotFound`] from the source
    /// - [`MigrationError::DepthExceeded`] if the tree is deeper than `max_depth`
    /// - [`MigrationError::Serialization`] if a payload cannot be flattened
    pub async fn walk(&self) -> Result<MountEntries> {
        let mut entries = MountEntries::new();
        self.walk_interior(self.mount.root(), &mut entries).await?;
        Ok(entries)
    }

    fn walk_interior<'w>(
        &'w self,
        dir: SecretPath,
        entries: &'w mut MountEntries,
    ) -> BoxFuture<'w, Result<()>> {
        async move {
            if dir.depth() > self.max_depth {
                return Err(MigrationError::depth_exceeded(dir.key(), self.max_depth));
            }

            let children = self.source.list_children(&dir, self.mount.version).await?;
            trace!(path = %dir, children = children.len(), "Listed interior node");

            for name in children {
                if name.is_empty() {
                    continue;
                }
                let child = dir.child(&name);
                if child.is_interior() {
                    self.walk_interior(child, entries).await?;
                } else {
                    self.visit_leaf(child, entries).await?;
                }
            }

            Ok(())
        }
        .boxed()
    }

    async fn visit_leaf(&self, leaf: SecretPath, entries: &mut MountEntries) -> Result<()> {
        let Some(payload) = self.source.read_secret(&leaf, self.mount.version).await? else {
            debug!(path = %leaf, "Secret has no data, skipping");
            return Ok(());
        };

        match normalize(&leaf, &payload)? {
            Some(value) => {
                entries.insert(leaf.key(), value);
            }
            None => debug!(path = %leaf, "Secret payload is empty, skipping"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemorySource, KvVersion, MountInfo, SecretPayload};
    use serde_json::json;

    fn payload(value: serde_json::Value) -> SecretPayload {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_walks_nested_tree() {
        let source = InMemorySource::new()
            .with_mount("kv/", MountInfo::new("kv"))
            .with_secret("kv/sub/leaf1", payload(json!({"value": "one"})))
            .with_secret("kv/sub/nested/leaf2", payload(json!({"value": "two"})))
            .with_secret("kv/top", payload(json!({"a": "b"})));
        let mount = Mount::new("kv", KvVersion::V2);

        let entries = TreeWalker::new(&source, &mount, DEFAULT_MAX_DEPTH).walk().await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries["kv/sub/leaf1"], "one");
        assert_eq!(entries["kv/sub/nested/leaf2"], "two");
        assert_eq!(entries["kv/top"], r#"{"a":"b"}"#);
    }

    #[tokio::test]
    async fn test_empty_payloads_are_skipped() {
        let source = InMemorySource::new()
            .with_mount("secret/", MountInfo::new("generic"))
            .with_empty_secret("secret/gone")
            .with_secret("secret/blank", SecretPayload::new())
            .with_secret("secret/kept", payload(json!({"value": "v"})));
        let mount = Mount::new("secret", KvVersion::V1);

        let entries = TreeWalker::new(&source, &mount, DEFAULT_MAX_DEPTH).walk().await.unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["secret/kept"]);
    }

    fn nested_source(mount: &str, info: MountInfo) -> InMemorySource {
        InMemorySource::new()
            .with_mount(format!("{}/", mount), info)
            .with_secret(format!("{}/top", mount), payload(json!({"value": "t"})))
            .with_secret(format!("{}/a/b/leaf", mount), payload(json!({"value": "l"})))
            .with_secret(format!("{}/a/c", mount), payload(json!({"k": "v"})))
    }

    #[tokio::test]
    async fn test_v2_variant_reaches_every_call() {
        let source = nested_source("kv", MountInfo::new("kv"));
        let mount = Mount::new("kv", KvVersion::V2);

        TreeWalker::new(&source, &mount, DEFAULT_MAX_DEPTH).walk().await.unwrap();

        let calls = source.calls();
        let keys: Vec<&str> = calls.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["kv/", "kv/a/", "kv/a/b/", "kv/a/b/leaf", "kv/a/c", "kv/top"]);
        assert!(calls.iter().all(|(_, version)| *version == KvVersion::V2));
    }

    #[tokio::test]
    async fn test_v1_variant_reaches_every_call() {
        let source = nested_source("secret", MountInfo::new("generic"));
        let mount = Mount::new("secret", KvVersion::V1);

        TreeWalker::new(&source, &mount, DEFAULT_MAX_DEPTH).walk().await.unwrap();

        let calls = source.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls.iter().all(|(_, version)| *version == KvVersion::V1));
    }

    #[tokio::test]
    async fn test_failure_aborts_walk() {
        let source = InMemorySource::new()
            .with_mount("secret/", MountInfo::new("generic"))
            .with_secret("secret/a", payload(json!({"value": "1"})))
            .with_secret("secret/b/c", payload(json!({"value": "2"})))
            .fail_listing("secret/b/");
        let mount = Mount::new("secret", KvVersion::V1);

        let err = TreeWalker::new(&source, &mount, DEFAULT_MAX_DEPTH).walk().await.unwrap_err();
        assert!(matches!(err, MigrationError::Transport { ref path, .. } if path == "secret/b/"));
    }

    #[tokio::test]
    async fn test_self_referential_listing_hits_depth_bound() {
        let source = InMemorySource::new()
            .with_mount("loop/", MountInfo::new("kv"))
            .with_listing("loop/", vec!["x/".to_string()])
            .with_listing("loop/x/", vec!["x/".to_string()])
            .with_listing("loop/x/x/", vec!["x/".to_string()])
            .with_listing("loop/x/x/x/", vec!["x/".to_string()]);
        let mount = Mount::new("loop", KvVersion::V2);

        let err = TreeWalker::new(&source, &mount, 2).walk().await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::DepthExceeded { ref path, max_depth: 2 } if path == "loop/x/x/x/"
        ));
    }

    #[tokio::test]
    async fn test_depth_bound_is_inclusive() {
        let source = InMemorySource::new()
            .with_mount("kv/", MountInfo::new("kv"))
            .with_secret("kv/a/b/leaf", payload(json!({"value": "deep"})));
        let mount = Mount::new("kv", KvVersion::V2);

        let entries = TreeWalker::new(&source, &mount, 2).walk().await.unwrap();
        assert_eq!(entries["kv/a/b/leaf"], "deep");

        let err = TreeWalker::new(&source, &mount, 1).walk().await.unwrap_err();
        assert!(matches!(err, MigrationError::DepthExceeded { .. }));
    }
}
