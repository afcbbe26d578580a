//! # Migration Engine
//!
//! Discovery, walk, aggregation and publication for one run:
//!
//! ```text
//! Classifier -> (per mount) TreeWalker -> normalize -> AggregateMap -> Publisher
//! ```
//!
//! Each mount moves through `discovered -> walking -> succeeded | failed`. Only a mount
//! whose walk fully succeeded is merged into the aggregate map, and the map is complete
//! before the first write is attempted. Reading is all-or-nothing per mount; writing is
//! best-effort per entry.
//!
//! # Example
//!
//! ```rust,ignore
//! use vault_to_ssm::destination::SsmParameterStore;
//! use vault_to_ssm::migration::{Migration, MigrationConfig};
//! use vault_to_ssm::source::VaultSource;
//!
//! let source = VaultSource::connect(&vault_config).await?;
//! let store = SsmParameterStore::from_config(&ssm_config).await;
//! let summary = Migration::new(source, store, MigrationConfig::default()).run().await?;
//! println!("{} parameters written", summary.publish.succeeded);
//! ```

pub mod aggregator;
pub mod classifier;
pub mod normalizer;
pub mod publisher;
pub mod walker;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info, Instrument};
use uuid::Uuid;
use validator::Validate;

use crate::destination::ParameterStore;
use crate::errors::Result;
use crate::source::{KvVersion, Mount, SecretSource};

pub use aggregator::{AggregateMap, MergeStats};
pub use classifier::{
    classify_mount, classify_mounts, parse_selectors, select_mounts, MountSelector,
};
pub use normalizer::normalize;
pub use publisher::{parameter_name, FailedWrite, PublishSummary, Publisher};
pub use walker::{MountEntries, TreeWalker, DEFAULT_MAX_DEPTH};

/// What to do when a mount's walk fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountErrorPolicy {
    /// Stop the run before anything is published
    #[default]
    Abort,
    /// Record the mount as failed and continue with the others
    Skip,
}

/// Run-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MigrationConfig {
    /// Mount allow-list (`secret`, `kv=kv2`); empty means discover everything
    pub mounts: Vec<String>,

    /// Maximum interior depth below a mount root
    #[validate(range(min = 1, max = 1024, message = "Max depth must be between 1 and 1024"))]
    pub max_depth: usize,

    /// Mount walks kept in flight
    #[validate(range(min = 1, max = 64, message = "Mount concurrency must be between 1 and 64"))]
    pub mount_concurrency: usize,

    /// Parameter writes kept in flight
    #[validate(range(
        min = 1,
        max = 64,
        message = "Publish concurrency must be between 1 and 64"
    ))]
    pub publish_concurrency: usize,

    pub on_mount_error: MountErrorPolicy,

    /// Walk and aggregate, but do not write
    pub dry_run: bool,

    /// Treat any failed write as a failed run
    pub fail_on_publish_error: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            mounts: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            mount_concurrency: 1,
            publish_concurrency: 1,
            on_mount_error: MountErrorPolicy::Abort,
            dry_run: false,
            fail_on_publish_error: false,
        }
    }
}

/// Terminal state of one mount's walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MountStatus {
    Succeeded,
    Failed { error: String },
}

/// Outcome of one mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountReport {
    pub mount: String,
    pub version: KvVersion,
    #[serde(flatten)]
    pub status: MountStatus,
    /// Flat entries the mount contributed
    pub entries: usize,
}

impl MountReport {
    fn succeeded(mount: &Mount, entries: usize) -> Self {
        Self {
            mount: mount.id.clone(),
            version: mount.version,
            status: MountStatus::Succeeded,
            entries,
        }
    }

    fn failed(mount: &Mount, error: String) -> Self {
        Self {
            mount: mount.id.clone(),
            version: mount.version,
            status: MountStatus::Failed { error },
            entries: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MountStatus::Succeeded
    }
}

/// Aggregate map plus the per-mount outcomes that produced it.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub aggregate: AggregateMap,
    pub mounts: Vec<MountReport>,
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub mounts: Vec<MountReport>,
    pub entries_collected: usize,
    pub publish: PublishSummary,
}

impl RunSummary {
    pub fn failed_mounts(&self) -> impl Iterator<Item = &MountReport> {
        self.mounts.iter().filter(|m| !m.is_success())
    }

    /// No failed mount and no failed write.
    pub fn is_clean(&self) -> bool {
        self.failed_mounts().next().is_none() && !self.publish.has_failures()
    }
}

/// One migration run from a [`SecretSource`] into a [`ParameterStore`].
pub struct Migration<S: SecretSource, P: ParameterStore> {
    source: S,
    publisher: Publisher<P>,
    config: MigrationConfig,
}

impl<S: SecretSource, P: ParameterStore> Migration<S, P> {
    pub fn new(source: S, store: P, config: MigrationConfig) -> Self {
        let publisher = Publisher::new(store)
            .with_concurrency(config.publish_concurrency)
            .with_dry_run(config.dry_run);
        Self { source, publisher, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn publisher(&self) -> &Publisher<P> {
        &self.publisher
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Resolve the mounts to migrate, ordered by id.
    ///
    /// Discovery is skipped when every allow-list entry names its variant.
    ///
    /// # Errors
    ///
    /// - [`MigrationError::Access`](crate::errors::MigrationError::Access) if discovery
    ///   yields no KV mount or a selected mount is not visible
    /// - [`MigrationError::UnknownProtocol`](crate::errors::MigrationError::UnknownProtocol)
    ///   for a selector with an unrecognized variant
    pub async fn discover(&self) -> Result<Vec<Mount>> {
        let selectors = parse_selectors(&self.config.mounts)?;

        let mounts = if selectors.is_empty() {
            classify_mounts(&self.source.list_mounts().await?)?
        } else if selectors.iter().all(MountSelector::is_explicit) {
            select_mounts(&selectors, &[])?
        } else {
            let discovered = classify_mounts(&self.source.list_mounts().await?)?;
            select_mounts(&selectors, &discovered)?
        };

        for mount in &mounts {
            info!(
                mount = %mount.id,
                version = %mount.version,
                state = "discovered",
                "Mount selected"
            );
        }

        Ok(mounts)
    }

    /// Walk a single mount to completion.
    pub async fn walk_mount(&self, mount: &Mount) -> Result<MountEntries> {
        let span = crate::mount_span!(mount.id, mount.version);
        async {
            info!(state = "walking", "Walking mount");
            TreeWalker::new(&self.source, mount, self.config.max_depth).walk().await
        }
        .instrument(span)
        .await
    }

    /// Walk every mount and merge the successful ones in mount order.
    ///
    /// Under [`MountErrorPolicy::Abort`] the first failure is returned and walks still in
    /// flight are dropped.
    pub async fn collect(&self, mounts: &[Mount]) -> Result<Collected> {
        let mut collected = Collected::default();

        let walks = stream::iter(mounts)
            .map(|mount| async move { (mount, self.walk_mount(mount).await) })
            .buffered(self.config.mount_concurrency.max(1));
        let mut walks = std::pin::pin!(walks);

        while let Some((mount, result)) = walks.next().await {
            match result {
                Ok(entries) => {
                    let count = entries.len();
                    let stats = collected.aggregate.merge(entries);
                    info!(
                        mount = %mount.id,
                        state = "succeeded",
                        entries = count,
                        overwritten = stats.overwritten,
                        "Mount walk succeeded"
                    );
                    collected.mounts.push(MountReport::succeeded(mount, count));
                }
                Err(e) => {
                    error!(mount = %mount.id, state = "failed", error = %e, "Mount walk failed");
                    match self.config.on_mount_error {
                        MountErrorPolicy::Abort => return Err(e),
                        MountErrorPolicy::Skip => {
                            collected.mounts.push(MountReport::failed(mount, e.to_string()))
                        }
                    }
                }
            }
        }

        Ok(collected)
    }

    /// Discover, walk, aggregate and publish.
    ///
    /// # Errors
    ///
    /// Any discovery error, and any walk error under [`MountErrorPolicy::Abort`]. Write
    /// failures never fail the run here; they are reported in [`RunSummary::publish`].
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let span = crate::run_span!(run_id, self.config.dry_run);

        async move {
            info!("Starting migration run");

            let mounts = self.discover().await?;
            let collected = self.collect(&mounts).await?;
            let entries_collected = collected.aggregate.len();
            info!(entries = entries_collected, "Aggregation complete");

            let publish = self.publisher.publish(&collected.aggregate).await;

            Ok(RunSummary {
                run_id,
                started_at,
                finished_at: Utc::now(),
                dry_run: self.config.dry_run,
                mounts: collected.mounts,
                entries_collected,
                publish,
            })
        }
        .instrument(span)
        .await
    }
}
