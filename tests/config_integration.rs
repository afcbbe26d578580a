//! Integration tests for configuration loading
//!
//! These tests exercise the file and environment layers against the real process
//! environment, so they are serialized with a mutex.

use std::env;
use std::sync::Mutex;
use tempfile::TempDir;
use vault_to_ssm::config::{self, CONFIG_PATH_ENV};
use vault_to_ssm::migration::MountErrorPolicy;
use vault_to_ssm::observability::LogFormat;
use vault_to_ssm::{MigrationError, Result};

// Use a mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: &[&str] = &[
    CONFIG_PATH_ENV,
    "VAULT_ADDR",
    "VAULT_TOKEN",
    "VAULT_NAMESPACE",
    "AWS_REGION",
    "AWS_PROFILE",
    "VAULT_TO_SSM_SSM_ENDPOINT",
    "VAULT_TO_SSM_MOUNTS",
    "VAULT_TO_SSM_MAX_DEPTH",
    "VAULT_TO_SSM_MOUNT_CONCURRENCY",
    "VAULT_TO_SSM_PUBLISH_CONCURRENCY",
    "VAULT_TO_SSM_DRY_RUN",
    "VAULT_TO_SSM_LOG_FORMAT",
];

/// Clears the variables under test and restores them on drop.
struct EnvSnapshot(Vec<(&'static str, Option<String>)>);

impl EnvSnapshot {
    fn take() -> Self {
        let saved = VARS.iter().map(|name| (*name, env::var(name).ok())).collect();
        for name in VARS {
            env::remove_var(name);
        }
        Self(saved)
    }
}

impl Drop for EnvSnapshot {
    fn drop(&mut self) {
        for (name, value) in &self.0 {
            match value {
                Some(value) => env::set_var(name, value),
                None => env::remove_var(name),
            }
        }
    }
}

const FILE: &str = r#"
[vault]
address = "https://vault.file:8200"
namespace = "platform"

[ssm]
region = "eu-central-1"
overwrite = false

[migration]
mounts = ["secret", "team/app=kv2"]
on_mount_error = "skip"
max_depth = 10

[logging]
level = "warn"
"#;

/// Test that the file layer and environment layer combine in priority order
#[test]
fn test_file_then_environment() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvSnapshot::take();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vault-to-ssm.toml");
    std::fs::write(&path, FILE).unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    env::set_var("VAULT_TOKEN", "hvs.from-env");
    env::set_var("VAULT_TO_SSM_MAX_DEPTH", "20");
    env::set_var("VAULT_TO_SSM_LOG_FORMAT", "json");

    let config = config::load(None)?;
    config.validate()?;

    assert_eq!(config.vault.address, "https://vault.file:8200");
    assert_eq!(config.vault.namespace.as_deref(), Some("platform"));
    assert_eq!(config.vault.token.as_ref().map(|t| t.expose_secret()), Some("hvs.from-env"));
    assert_eq!(config.ssm.region.as_deref(), Some("eu-central-1"));
    assert!(!config.ssm.overwrite);
    assert_eq!(config.migration.mounts, vec!["secret", "team/app=kv2"]);
    assert_eq!(config.migration.on_mount_error, MountErrorPolicy::Skip);
    assert_eq!(config.migration.max_depth, 20);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, LogFormat::Json);

    Ok(())
}

/// Test that an explicit path wins over the environment variable
#[test]
fn test_explicit_path_wins() -> Result<()> {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvSnapshot::take();

    let temp_dir = TempDir::new().unwrap();
    let explicit = temp_dir.path().join("explicit.toml");
    std::fs::write(&explicit, "[vault]\naddress = \"https://explicit:8200\"\n").unwrap();
    env::set_var(CONFIG_PATH_ENV, temp_dir.path().join("does-not-exist.toml"));

    let config = config::load(Some(&explicit))?;
    assert_eq!(config.vault.address, "https://explicit:8200");

    Ok(())
}

/// Test that a missing file named by the environment is an error
#[test]
fn test_missing_file_from_environment() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvSnapshot::take();

    let temp_dir = TempDir::new().unwrap();
    env::set_var(CONFIG_PATH_ENV, temp_dir.path().join("missing.toml"));

    let err = config::load(None).unwrap_err();
    assert!(matches!(err, MigrationError::Configuration { .. }));
}

/// Test that invalid environment values surface as configuration errors
#[test]
fn test_invalid_environment_values() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let _env = EnvSnapshot::take();

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.toml");
    std::fs::write(&path, "").unwrap();
    env::set_var(CONFIG_PATH_ENV, &path);

    env::set_var("VAULT_TO_SSM_PUBLISH_CONCURRENCY", "many");
    assert!(config::load(None).is_err());

    env::set_var("VAULT_TO_SSM_PUBLISH_CONCURRENCY", "0");
    let config = config::load(None).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Publish concurrency"));
}
