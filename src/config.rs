use anyhow::{anyhow, Result};
use log::{info, LevelFilter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable that overrides the configured log level.
pub const LOG_LEVEL_ENV: &str = "KIK_STANZA_LOG";

/// Settings for the `kik-stanza` command line tool.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// Peer used by `encode` when `--to` is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_peer: Option<String>,
}

impl Config {
    /// Effective log level: environment first, then the file, then `Warn`.
    pub fn level_filter(&self) -> LevelFilter {
        std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| self.log_level.clone())
            .and_then(|level| LevelFilter::from_str(&level).ok())
            .unwrap_or(LevelFilter::Warn)
    }
}

static CONFIG_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Use `path` instead of the per-user config file. Only the first call wins.
pub fn set_config_path_override(path: PathBuf) -> Result<()> {
    CONFIG_PATH_OVERRIDE
        .set(path)
        .map_err(|path| anyhow!("Config path already set, ignoring {}", path.display()))
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("kik-stanza");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn get_config_path() -> Result<PathBuf> {
    if let Some(path) = CONFIG_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("config.json"))
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;

    info!("Config saved to {}", path.display());
    Ok(())
}

pub fn load_config() -> Result<Option<Config>> {
    load_config_from(&get_config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let config: Config = serde_json::from_str(&contents)?;
    info!("Loaded config from {}", path.display());

    Ok(Some(config))
}
