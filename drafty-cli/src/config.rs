// Config file and environment handling

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use drafty_share::RegistryConfig;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "drafty.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: String, // "memory", "local", "sqlite"
    pub local_path: Option<String>,
    pub sqlite_path: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local_path: None,
            sqlite_path: None,
        }
    }
}

fn default_backend() -> String {
    "local".into()
}

impl Config {
    /// File first, then `DRAFTY_` variables (`DRAFTY_STORE__BACKEND=sqlite`)
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::figment(path)
            .extract()
            .context("Failed to load drafty configuration")
    }

    fn figment(path: Option<&str>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(DEFAULT_CONFIG_FILE)))
            .merge(Env::prefixed("DRAFTY_").split("__"))
    }
}

impl StoreConfig {
    /// Directory for the local backend
    pub fn local_dir(&self) -> Result<PathBuf> {
        match &self.local_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("store")),
        }
    }

    #[cfg_attr(not(feature = "sqlite"), allow(dead_code))]
    pub fn sqlite_file(&self) -> Result<PathBuf> {
        match &self.sqlite_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("drafty.db")),
        }
    }
}

fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "drafty", "drafty")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}
