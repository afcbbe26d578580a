//! # Configuration Management
//!
//! Layered configuration, lowest to highest priority:
//!
//! 1. built-in defaults
//! 2. a TOML file: the explicit path, else `VAULT_TO_SSM_CONFIG`, else
//!    `~/.vault-to-ssm/config.toml` when it exists
//! 3. environment variables (see [`settings::env`])
//! 4. command line flags, applied by the CLI
//!
//! ```toml
//! [vault]
//! address = "https://vault.example.com:8200"
//!
//! [ssm]
//! region = "eu-west-1"
//!
//! [migration]
//! mounts = ["secret", "team/app=kv2"]
//! on_mount_error = "skip"
//! ```

pub mod settings;

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{MigrationError, Result};

pub use settings::{split_list, AppConfig};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "VAULT_TO_SSM_CONFIG";

const CONFIG_DIR: &str = ".vault-to-ssm";
const CONFIG_FILE: &str = "config.toml";

/// `~/.vault-to-ssm/config.toml`, if a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_path_with(&|name| std::env::var(name).ok())
}

fn default_config_path_with(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    let home = lookup("HOME").or_else(|| lookup("USERPROFILE"))?;
    Some(PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration from the file layer and the process environment.
///
/// The result is not validated; callers apply their own overrides first.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    load_with(path, |name| std::env::var(name).ok())
}

/// [`load`] with an injectable environment.
///
/// # Errors
///
/// - [`MigrationError::Configuration`] if an explicitly named file is missing, unreadable or
///   malformed, or an environment variable holds an unparsable value
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| lookup(CONFIG_PATH_ENV).filter(|p| !p.is_empty()).map(PathBuf::from));

    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(MigrationError::config(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            load_file(&path)?
        }
        None => match default_config_path_with(&lookup) {
            Some(path) if path.exists() => load_file(&path)?,
            _ => {
                debug!("No configuration file, using defaults");
                AppConfig::default()
            }
        },
    };

    config.apply_env_with(lookup)?;
    Ok(config)
}

fn load_file(path: &Path) -> Result<AppConfig> {
    debug!(path = %path.display(), "Loading configuration file");

    let contents = std::fs::read_to_string(path).map_err(|e| {
        MigrationError::config_with_source(
            format!("Failed to read config file: {}", path.display()),
            Box::new(e),
        )
    })?;

    AppConfig::from_toml_str(&contents).map_err(|e| match e {
        MigrationError::Configuration { source, .. } => MigrationError::Configuration {
            message: format!("Failed to parse config file: {}", path.display()),
            source,
        },
        other => other,
    })
}
