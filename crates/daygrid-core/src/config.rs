use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{info, warn};

const CONFIG_FILE: &str = "daygrid.toml";
const CONFIG_ENV_VAR: &str = "DAYGRID_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    data: Option<DataSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DataSection {
    location: Option<String>,
}

impl Config {
    /// Loads the config file. Resolution order: explicit override,
    /// DAYGRID_CONFIG, the user config directory. A missing default file
    /// means defaults; a missing override is an error.
    #[tracing::instrument(skip(override_path))]
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = resolve_config_path(override_path) else {
            warn!("no config location found; using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            if override_path.is_some() {
                return Err(anyhow!("config file does not exist: {}", path.display()));
            }
            info!(file = %path.display(), "config file not found; using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        info!(file = %path.display(), "loaded config");
        Ok(cfg)
    }

    pub fn data_location(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|section| section.location.as_deref())
    }
}

fn resolve_config_path(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    dirs::config_dir().map(|dir| dir.join("daygrid").join(CONFIG_FILE))
}

#[tracing::instrument(skip(cfg, override_dir))]
pub fn resolve_data_dir(cfg: &Config, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Some(location) = cfg.data_location() {
        expand_tilde(Path::new(location))
    } else {
        default_data_dir()?
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".daygrid"))
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}
