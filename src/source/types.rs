//! Data model shared by discovery, the walker and the normalizer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{MigrationError, Result};

/// Path separator used by Vault paths and SSM parameter names.
pub const SEPARATOR: char = '/';

/// Payload returned by the source for a leaf: field name to JSON value.
pub type SecretPayload = serde_json::Map<String, serde_json::Value>;

/// Protocol variant of a KV mount.
///
/// Chosen once per mount during classification and carried unchanged through its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KvVersion {
    /// KV version 1 (also the legacy `generic` engine)
    #[serde(rename = "kv1")]
    V1,
    /// KV version 2 (versioned, data/metadata endpoints)
    #[serde(rename = "kv2")]
    V2,
}

impl KvVersion {
    /// Parse a variant name given for `mount`.
    ///
    /// Accepts `kv1`, `v1`, `1` and `kv2`, `v2`, `2` in any case.
    pub fn parse(mount: &str, variant: &str) -> Result<Self> {
        match variant.trim().to_ascii_lowercase().as_str() {
            "kv1" | "v1" | "1" => Ok(KvVersion::V1),
            "kv2" | "v2" | "2" => Ok(KvVersion::V2),
            _ => Err(MigrationError::unknown_protocol(mount, variant)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KvVersion::V1 => "kv1",
            KvVersion::V2 => "kv2",
        }
    }
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine metadata reported by the source for one mount point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MountInfo {
    /// Engine type, e.g. `kv`, `generic`, `pki`
    pub kind: String,
    /// Engine options, e.g. `version = "2"`
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl MountInfo {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into(), options: HashMap::new() }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A KV mount selected for migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mount {
    /// Mount path without surrounding separators, e.g. `secret` or `team/app`
    pub id: String,
    pub version: KvVersion,
}

impl Mount {
    pub fn new(id: impl AsRef<str>, version: KvVersion) -> Self {
        Self { id: normalize_mount_id(id.as_ref()), version }
    }

    /// Root of this mount's tree.
    pub fn root(&self) -> SecretPath {
        SecretPath::new(self.id.clone(), "")
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{} ({})", self.id, SEPARATOR, self.version)
    }
}

/// Strip the separators Vault puts around mount paths (`secret/` -> `secret`).
pub fn normalize_mount_id(id: &str) -> String {
    id.trim_matches(SEPARATOR).to_string()
}

/// A node in a mount's tree, addressed relative to the mount.
///
/// A relative path that is empty or ends with the separator is an interior node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretPath {
    mount: String,
    relative: String,
}

impl SecretPath {
    pub fn new(mount: impl Into<String>, relative: impl Into<String>) -> Self {
        Self { mount: mount.into(), relative: relative.into() }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn is_interior(&self) -> bool {
        self.relative.is_empty() || self.relative.ends_with(SEPARATOR)
    }

    /// Join a listed child name onto this interior path.
    pub fn child(&self, name: &str) -> SecretPath {
        SecretPath::new(self.mount.clone(), format!("{}{}", self.relative, name))
    }

    /// Number of interior levels below the mount root.
    pub fn depth(&self) -> usize {
        self.relative.matches(SEPARATOR).count()
    }

    /// Full path including the mount, without a leading separator.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.mount, SEPARATOR, self.relative)
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.mount, SEPARATOR, self.relative)
    }
}

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// Used for the Vault token. The value is zeroed when dropped and can only be read via
/// [`SecretString::expose_secret`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
