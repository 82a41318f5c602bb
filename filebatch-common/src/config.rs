//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Environment variable (highest)
//! 2. TOML config file
//! 3. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Maximum uploaded file size in bytes (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum number of files accepted per upload request
pub const DEFAULT_MAX_BATCH_FILES: usize = 50;

/// Optional settings read from the TOML config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub max_file_size: Option<u64>,
    pub max_batch_files: Option<usize>,
}

/// Fully-resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_file_size: u64,
    pub max_batch_files: usize,
}

impl ServiceConfig {
    /// Resolve configuration from environment, TOML file, and defaults
    ///
    /// The config file location itself can be overridden with
    /// `FILEBATCH_CONFIG`; otherwise the platform config directory is
    /// consulted (`~/.config/filebatch/config.toml` on Linux).
    pub fn resolve() -> Result<Self> {
        let toml_config = match config_file_path() {
            Some(path) if path.exists() => load_toml_config(&path)?,
            _ => TomlConfig::default(),
        };
        Ok(Self::from_sources(toml_config))
    }

    /// Merge environment overrides on top of TOML values and defaults
    pub fn from_sources(toml_config: TomlConfig) -> Self {
        let data_dir = default_data_dir();

        let host = env_var("FILEBATCH_HOST")
            .or(toml_config.host)
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let port = env_var("FILEBATCH_PORT")
            .and_then(|v| v.parse().ok())
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        let database_path = env_var("FILEBATCH_DATABASE")
            .map(PathBuf::from)
            .or(toml_config.database_path)
            .unwrap_or_else(|| data_dir.join("filebatch.db"));

        let upload_dir = env_var("FILEBATCH_UPLOAD_DIR")
            .map(PathBuf::from)
            .or(toml_config.upload_dir)
            .unwrap_or_else(|| data_dir.join("uploads"));

        let max_file_size = env_var("FILEBATCH_MAX_FILE_SIZE")
            .and_then(|v| v.parse().ok())
            .or(toml_config.max_file_size)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        let max_batch_files = env_var("FILEBATCH_MAX_BATCH_FILES")
            .and_then(|v| v.parse().ok())
            .or(toml_config.max_batch_files)
            .unwrap_or(DEFAULT_MAX_BATCH_FILES);

        Self {
            host,
            port,
            database_path,
            upload_dir,
            max_file_size,
            max_batch_files,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Config file location: `FILEBATCH_CONFIG` env, else platform config dir
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_var("FILEBATCH_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("filebatch").join("config.toml"))
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("filebatch"))
        .unwrap_or_else(|| PathBuf::from("./filebatch_data"))
}
