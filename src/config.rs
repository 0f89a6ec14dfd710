//! Optional `adb.toml` configuration
//!
//! Precedence for every setting is: command-line flag, then config file, then
//! built-in default.

use crate::registry::default_root;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FORMAT: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdbConfig {
    /// Storage root; the snapshot lives under `<root>/adb/`
    pub root: Option<String>,
    /// Serialization format name (json, xml, yaml)
    pub format: Option<String>,
}

impl AdbConfig {
    /// Pick the root: explicit flag, then config, then `$ADB_ROOT`/`$HOME`/`.`
    pub fn resolve_root(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.root.as_deref().map(PathBuf::from))
            .unwrap_or_else(default_root)
    }

    pub fn resolve_format(&self, flag: Option<&str>) -> String {
        flag.or(self.format.as_deref())
            .unwrap_or(DEFAULT_FORMAT)
            .trim()
            .to_lowercase()
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("adb.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AdbConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AdbConfig = toml::from_str(&contents)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AdbConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
