//! # vault-to-ssm
//!
//! Copies secrets stored in HashiCorp Vault KV engines into AWS Systems Manager Parameter
//! Store.
//!
//! ## Architecture
//!
//! ```text
//! ListMounts → Classifier → (per mount) TreeWalker → normalize → AggregateMap → Publisher
//!                                ↓                                                  ↓
//!                          SecretSource (Vault)                      ParameterStore (SSM)
//! ```
//!
//! Every KV mount visible to the token is discovered and tagged with its protocol variant
//! (KV v1 or KV v2). Each mount's tree is walked depth-first, every secret is flattened to
//! a single string, and all results are merged into one map keyed by full path. Only once
//! that map is complete is each entry written as a `String` parameter named `/<path>`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vault_to_ssm::config::AppConfig;
//! use vault_to_ssm::destination::SsmParameterStore;
//! use vault_to_ssm::migration::Migration;
//! use vault_to_ssm::source::VaultSource;
//!
//! #[tokio::main]
//! async fn main() -> vault_to_ssm::Result<()> {
//!     let mut config = AppConfig::default();
//!     config.apply_env()?;
//!     config.validate()?;
//!
//!     let source = VaultSource::connect(&config.vault).await?;
//!     let store = SsmParameterStore::from_config(&config.ssm).await;
//!     let summary = Migration::new(source, store, config.migration).run().await?;
//!     println!("{} parameters written", summary.publish.succeeded);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod destination;
pub mod errors;
pub mod migration;
pub mod observability;
pub mod source;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{MigrationError, Result};
pub use migration::{Migration, RunSummary};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
