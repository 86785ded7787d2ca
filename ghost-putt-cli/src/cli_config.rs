use anyhow::{Context, Result};
use ghost_putt::relay::RelayConfig;
use ghost_putt::session::SessionConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_LINK_BASE: &str = "http://localhost:5173/";

/// Contents of the optional `--config` TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub session: SessionConfig,
    pub relay: RelayConfig,
    /// Where the player name and last room are remembered.
    pub store_path: Option<PathBuf>,
    /// Page that shared links point at.
    pub link_base: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            relay: RelayConfig::default(),
            store_path: None,
            link_base: DEFAULT_LINK_BASE.to_owned(),
        }
    }
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }
}
