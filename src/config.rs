use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

use crate::types::ColumnNames;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    pub landing_image: PathBuf,
    #[serde(default = "default_caption")]
    pub landing_caption: String,
    // false keeps rows whose only gaps are in columns the dashboard never reads
    #[serde(default = "default_true")]
    pub require_all_columns: bool,
    #[serde(default)]
    pub columns: ColumnConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ColumnConfig {
    pub status: String,
    pub category: String,
    pub zip_code: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            status: "app_license_status".to_string(),
            category: "app_license_category".to_string(),
            zip_code: "facility_zip_code".to_string(),
            name: "id_name_first".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
        }
    }
}

impl From<&ColumnConfig> for ColumnNames {
    fn from(c: &ColumnConfig) -> Self {
        ColumnNames {
            name: c.name.clone(),
            status: c.status.clone(),
            category: c.category.clone(),
            zip_code: c.zip_code.clone(),
            latitude: c.latitude.clone(),
            longitude: c.longitude.clone(),
        }
    }
}

/// Initial map view shown before the user touches the sidebar inputs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub pitch: u8,
    pub style: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            latitude: 42.3601,
            longitude: -71.0589,
            zoom: 11,
            pitch: 50,
            style: "mapbox://styles/mapbox/light-v9".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub asset_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

fn default_caption() -> String {
    "Here, you will know where to go for cannabis!".to_string()
}

fn default_true() -> bool {
    true
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
