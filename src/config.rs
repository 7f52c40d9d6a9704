use crate::{FillcheckConfig, TailPolicy, ViewAccess, DEFAULT_BLOCK_SIZE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub defaults: DefaultConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    #[serde(default)]
    pub tail: TailPolicy,
    #[serde(default)]
    pub access: ViewAccess,
    #[serde(default)]
    pub progress: bool,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            tail: TailPolicy::default(),
            access: ViewAccess::default(),
            progress: false,
        }
    }
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl ConfigFile {
    pub fn to_fillcheck_config(&self) -> FillcheckConfig {
        FillcheckConfig {
            block_size: self.defaults.block_size,
            tail: self.defaults.tail,
            access: self.defaults.access,
            progress: self.defaults.progress,
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        Ok(PathBuf::from(xdg_config_home)
            .join("fillcheck")
            .join("config.toml"))
    } else if let Ok(home) = std::env::var("HOME") {
        Ok(PathBuf::from(home)
            .join(".config")
            .join("fillcheck")
            .join("config.toml"))
    } else {
        Err(anyhow::anyhow!("Could not determine config directory"))
    }
}

/// Load the config file from the default location, or defaults if there is none.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(config_path: &Path) -> Result<ConfigFile> {
    if !config_path.exists() {
        debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(ConfigFile::default());
    }

    let config_str = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    let config: ConfigFile = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    debug!(path = %config_path.display(), "loaded config file");
    Ok(config)
}

pub fn create_default_config(path: &Path) -> Result<()> {
    let default_config = ConfigFile::default();
    let config_str =
        toml::to_string_pretty(&default_config).context("Failed to serialize default config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }

    fs::write(path, config_str)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_creation() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        create_default_config(&config_path)?;
        assert!(config_path.exists());

        let config = load_config_from(&config_path)?;
        assert_eq!(config.defaults.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.defaults.tail, TailPolicy::Clamp);
        assert_eq!(config.defaults.access, ViewAccess::Mmap);
        assert!(!config.defaults.progress);

        Ok(())
    }

    #[test]
    fn test_missing_config_yields_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("absent.toml");

        let config = load_config_from(&config_path)?;
        assert_eq!(config.defaults.block_size, DEFAULT_BLOCK_SIZE);
        assert!(!config_path.exists());
        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[defaults]\nblock_size = 4096\ntail = \"full-block\"\n",
        )?;

        let config = load_config_from(&config_path)?.to_fillcheck_config();
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.tail, TailPolicy::FullBlock);
        assert_eq!(config.access, ViewAccess::Mmap);
        Ok(())
    }

    #[test]
    fn test_malformed_config_is_an_error() -> Result<()> {
        let temp_dir = tempdir()?;
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[defaults]\ntail = \"sideways\"\n")?;

        assert!(load_config_from(&config_path).is_err());
        Ok(())
    }
}
