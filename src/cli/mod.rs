//! # Command Line Interface
//!
//! `vault-to-ssm migrate` copies every KV secret readable with the configured token into
//! Parameter Store; `vault-to-ssm mounts` shows which mounts a migration would cover.

pub mod config;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::{AppConfig, CONFIG_PATH_ENV};
use crate::destination::SsmParameterStore;
use crate::migration::{classify_mounts, Migration};
use crate::observability::{init_logging, log_config_info, LogFormat};
use crate::source::{SecretSource, VaultSource};
use config::{resolve_config, RunArgs, SsmArgs, VaultArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "vault-to-ssm")]
#[command(about = "Copy HashiCorp Vault KV secrets into AWS SSM Parameter Store")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: ~/.vault-to-ssm/config.toml)
    #[arg(long, global = true, env = CONFIG_PATH_ENV, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate secrets from Vault to Parameter Store
    Migrate {
        #[command(flatten)]
        vault: VaultArgs,

        #[command(flatten)]
        ssm: SsmArgs,

        #[command(flatten)]
        run: RunArgs,

        /// Run summary format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// List the KV mounts a migration would cover
    Mounts {
        #[command(flatten)]
        vault: VaultArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate { vault, ssm, run, output } => {
            let config = resolve_config(cli.config.as_deref(), cli.log_format, |config| {
                vault.apply(&mut config.vault);
                ssm.apply(&mut config.ssm);
                run.apply(config);
            })?;
            init_logging(&config.logging, cli.verbose)?;
            handle_migrate(&config, output).await
        }
        Commands::Mounts { vault, output } => {
            let config = resolve_config(cli.config.as_deref(), cli.log_format, |config| {
                vault.apply(&mut config.vault);
            })?;
            init_logging(&config.logging, cli.verbose)?;
            handle_mounts(&config, output).await
        }
    }
}

async fn handle_migrate(config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    log_config_info(config);

    let source = VaultSource::connect(&config.vault).await?;
    let store = SsmParameterStore::from_config(&config.ssm).await;
    let migration = Migration::new(source, store, config.migration.clone());

    let summary = match migration.run().await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Migration aborted before publishing");
            return Err(e.into());
        }
    };

    output::print_run_summary(&summary, format)?;

    let failed_mounts = summary.failed_mounts().count();
    if failed_mounts > 0 {
        warn!(failed_mounts, "Some mounts were skipped after failing");
    }

    if summary.publish.has_failures() {
        let failed = summary.publish.failed.len();
        warn!(failed, "Some parameters could not be written");
        if config.migration.fail_on_publish_error {
            anyhow::bail!("{} of {} parameter writes failed", failed, summary.publish.attempted);
        }
    }

    info!(
        run_id = %summary.run_id,
        written = summary.publish.succeeded,
        dry_run = summary.dry_run,
        "Migration finished"
    );
    Ok(())
}

async fn handle_mounts(config: &AppConfig, format: OutputFormat) -> anyhow::Result<()> {
    let source = VaultSource::connect(&config.vault).await?;
    let mounts = classify_mounts(&source.list_mounts().await?)?;
    output::print_mounts(&mounts, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MountErrorPolicy;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_migrate_flags() {
        let cli = Cli::try_parse_from([
            "vault-to-ssm",
            "migrate",
            "--vault-addr",
            "https://vault:8200",
            "--mount",
            "secret",
            "--mount",
            "kv=kv2",
            "--skip-failed-mounts",
            "--dry-run",
            "--output",
            "json",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormat::Json));
        let Commands::Migrate { vault, run, output, .. } = cli.command else {
            panic!("expected migrate");
        };
        assert_eq!(vault.vault_addr.as_deref(), Some("https://vault:8200"));
        assert_eq!(run.mounts, vec!["secret", "kv=kv2"]);
        assert_eq!(output, OutputFormat::Json);

        let mut config = AppConfig::default();
        run.apply(&mut config);
        assert_eq!(config.migration.on_mount_error, MountErrorPolicy::Skip);
        assert!(config.migration.dry_run);
    }

    #[test]
    fn test_parse_mounts_defaults_to_table() {
        let cli = Cli::try_parse_from(["vault-to-ssm", "mounts"]).unwrap();
        assert!(matches!(cli.command, Commands::Mounts { output: OutputFormat::Table, .. }));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["vault-to-ssm", "mounts", "--output", "xml"]).is_err());
    }
}
