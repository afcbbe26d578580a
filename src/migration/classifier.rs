//! Backend classification and mount selection.
//!
//! Maps each discovered mount's engine type and options onto a [`KvVersion`]:
//!
//! | Engine     | `version` option | Variant |
//! |------------|------------------|---------|
//! | `generic`  | any              | `kv1`   |
//! | `kv`       | `"1"`            | `kv1`   |
//! | `kv`       | anything else    | `kv2`   |
//! | other      |                  | skipped |

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::errors::{MigrationError, Result};
use crate::source::{normalize_mount_id, KvVersion, Mount, MountInfo};

/// Legacy engine type, always KV version 1
pub const LEGACY_KV_ENGINE: &str = "generic";

/// Modern KV engine type, version taken from the `version` option
pub const KV_ENGINE: &str = "kv";

const VERSION_OPTION: &str = "version";

/// Variant for one mount, or `None` if its engine is not a KV engine.
pub fn classify_mount(info: &MountInfo) -> Option<KvVersion> {
    match info.kind.as_str() {
        LEGACY_KV_ENGINE => Some(KvVersion::V1),
        KV_ENGINE => match info.options.get(VERSION_OPTION).map(String::as_str) {
            Some("1") => Some(KvVersion::V1),
            _ => Some(KvVersion::V2),
        },
        _ => None,
    }
}

/// Classify every discovered mount and keep the KV ones, ordered by mount id.
///
/// # Errors
///
/// - [`MigrationError::Access`] if no KV mount remains
pub fn classify_mounts(mounts: &HashMap<String, MountInfo>) -> Result<Vec<Mount>> {
    let mut classified = BTreeMap::new();

    for (path, info) in mounts {
        match classify_mount(info) {
            Some(version) => {
                let mount = Mount::new(path, version);
                debug!(mount = %mount.id, version = %version, "Classified mount");
                classified.insert(mount.id.clone(), mount);
            }
            None => debug!(mount = %path, kind = %info.kind, "Skipping non-KV mount"),
        }
    }

    if classified.is_empty() {
        return Err(MigrationError::access("No mounts found or your token has no access."));
    }

    info!(discovered = mounts.len(), selected = classified.len(), "Classified mounts");
    Ok(classified.into_values().collect())
}

/// One entry of the mount allow-list: `secret` or `secret=kv1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSelector {
    pub mount: String,
    /// Explicit variant; `None` defers to discovery
    pub version: Option<KvVersion>,
}

impl MountSelector {
    pub fn is_explicit(&self) -> bool {
        self.version.is_some()
    }
}

impl FromStr for MountSelector {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self> {
        let (mount, version) = match s.split_once('=') {
            Some((mount, variant)) => {
                let mount = normalize_mount_id(mount.trim());
                let version = KvVersion::parse(&mount, variant)?;
                (mount, Some(version))
            }
            None => (normalize_mount_id(s.trim()), None),
        };

        if mount.is_empty() {
            return Err(MigrationError::config(format!("Invalid mount selector '{}'", s)));
        }

        Ok(Self { mount, version })
    }
}

impl fmt::Display for MountSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}={}", self.mount, version),
            None => f.write_str(&self.mount),
        }
    }
}

/// Parse a list of selector strings.
pub fn parse_selectors<S: AsRef<str>>(raw: &[S]) -> Result<Vec<MountSelector>> {
    raw.iter().map(|s| s.as_ref().parse()).collect()
}

/// Resolve the allow-list against the discovered (already classified) mounts.
///
/// Explicit selectors are used as given. Selectors without a variant must appear in
/// `discovered`. The result is de-duplicated and ordered by mount id; when a mount is
/// selected twice the later selector wins.
///
/// # Errors
///
/// - [`MigrationError::Access`] if a selector names a mount that was not discovered
pub fn select_mounts(selectors: &[MountSelector], discovered: &[Mount]) -> Result<Vec<Mount>> {
    let mut selected = BTreeMap::new();

    for selector in selectors {
        let mount = match selector.version {
            Some(version) => Mount::new(&selector.mount, version),
            None => discovered.iter().find(|m| m.id == selector.mount).cloned().ok_or_else(|| {
                MigrationError::access(format!(
                    "Mount '{}' was not found or your token has no access",
                    selector.mount
                ))
            })?,
        };
        selected.insert(mount.id.clone(), mount);
    }

    Ok(selected.into_values().collect())
}
