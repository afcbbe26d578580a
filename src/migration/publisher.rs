//! Best-effort publication of the aggregate map.
//!
//! Every entry becomes one independent `String` parameter named `/{flat key}`. A failed
//! write is logged and recorded, and publication carries on with the remaining entries.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::aggregator::AggregateMap;
use crate::destination::{ParameterStore, ParameterType};
use crate::errors::Result;
use crate::source::SEPARATOR;

/// Destination name for a flat key: the key with a single leading separator.
pub fn parameter_name(key: &str) -> String {
    format!("{}{}", SEPARATOR, key.trim_start_matches(SEPARATOR))
}

/// A write the destination rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedWrite {
    pub name: String,
    pub error: String,
}

/// Per-run publication counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Failed writes ordered by parameter name
    pub failed: Vec<FailedWrite>,
}

impl PublishSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Writes an [`AggregateMap`] to an injected [`ParameterStore`].
pub struct Publisher<P: ParameterStore> {
    store: P,
    concurrency: usize,
    dry_run: bool,
}

impl<P: ParameterStore> Publisher<P> {
    pub fn new(store: P) -> Self {
        Self { store, concurrency: 1, dry_run: false }
    }

    /// Number of writes kept in flight (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Log the writes instead of performing them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write every entry, continuing past failures.
    pub async fn publish(&self, entries: &AggregateMap) -> PublishSummary {
        let outcomes: Vec<(String, Result<()>)> = stream::iter(entries.iter())
            .map(|(key, value)| self.publish_entry(key, value))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut summary = PublishSummary { attempted: outcomes.len(), ..Default::default() };
        for (name, result) in outcomes {
            match result {
                Ok(()) => summary.succeeded += 1,
                Err(e) => summary.failed.push(FailedWrite { name, error: e.to_string() }),
            }
        }
        summary.failed.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            dry_run = self.dry_run,
            "Publish finished"
        );

        summary
    }

    async fn publish_entry(&self, key: &str, value: &str) -> (String, Result<()>) {
        let name = parameter_name(key);

        if self.dry_run {
            info!(parameter = %name, "Dry run, would write parameter");
            return (name, Ok(()));
        }

        let result = self.store.put_parameter(&name, value, ParameterType::String).await;
        match &result {
            Ok(()) => info!(parameter = %name, "Parameter '{}' created successfully.", name),
            Err(e) => error!(parameter = %name, error = %e, "Failed to write parameter"),
        }

        (name, result)
    }
}
