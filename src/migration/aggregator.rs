//! Global flat mapping built from per-mount results.

use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use super::walker::MountEntries;

/// Outcome of merging one mount's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub overwritten: usize,
}

/// Flat key to value mapping for the whole run.
///
/// Merges are a plain union; on a key collision the entry merged last wins. Debug output
/// lists keys only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AggregateMap {
    entries: BTreeMap<String, String>,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fully walked mount into the map.
    pub fn merge(&mut self, partial: MountEntries) -> MergeStats {
        let mut stats = MergeStats::default();
        for (key, value) in partial {
            if self.entries.insert(key.clone(), value).is_some() {
                warn!(key = %key, "Flat key collision, keeping the most recent value");
                stats.overwritten += 1;
            } else {
                stats.inserted += 1;
            }
        }
        stats
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl fmt::Debug for AggregateMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateMap")
            .field("len", &self.entries.len())
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
