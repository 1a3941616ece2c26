//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "FLEET_ROOT";

/// Directory name used under the platform config/data dirs
const APP_DIR: &str = "dronefleet";

/// Service settings read from `<root>/config.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// SQLite file name, relative to the root folder
    pub database_file: String,
    /// Lifetime of an emailed login challenge
    pub challenge_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            database_file: "fleet.db".to_string(),
            challenge_ttl_minutes: 15,
        }
    }
}

impl ServerConfig {
    /// Load `config.toml` from the root folder
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load(root_folder: &Path) -> Result<Self> {
        let path = root_folder.join("config.toml");
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if config.challenge_ttl_minutes <= 0 {
            return Err(Error::Config(
                "challenge_ttl_minutes must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// Absolute database path under the root folder
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.database_file)
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Ok(config_path) = find_config_file() {
        match root_folder_from_file(&config_path) {
            Ok(Some(root)) => return root,
            Ok(None) => {}
            Err(e) => warn!("Ignoring {}: {}", config_path.display(), e),
        }
    }

    default_root_folder()
}

fn root_folder_from_file(config_path: &Path) -> Result<Option<PathBuf>> {
    let content = std::fs::read_to_string(config_path)?;
    let value = toml::from_str::<toml::Value>(&content)
        .map_err(|e| Error::Config(e.to_string()))?;

    Ok(value
        .get("root_folder")
        .and_then(|v| v.as_str())
        .map(PathBuf::from))
}

/// Locate the user or system config file
fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./dronefleet_data"))
}

/// Create the root folder if needed
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder: {}", root_folder.display());
    }
    Ok(())
}
