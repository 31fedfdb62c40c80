use crate::projection::HoverField;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub dataset_dir: PathBuf, // One file per (industry, nativity)
    #[serde(default = "default_extension")]
    pub extension: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_wrap_width")]
    pub wrap_width: usize,
    #[serde(default = "default_hover_fields")]
    pub default_hover_fields: Vec<HoverField>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            wrap_width: default_wrap_width(),
            default_hover_fields: default_hover_fields(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

fn default_extension() -> String {
    "geojson".to_string()
}

fn default_wrap_width() -> usize {
    25
}

fn default_hover_fields() -> Vec<HoverField> {
    HoverField::ALL.to_vec()
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
