use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (override CLI)
    pub db_path: Option<String>,
    pub batch_size: Option<usize>,

    pub years: Option<YearsConfig>,
    pub ranking: Option<RankingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct YearsConfig {
    pub min: Option<u16>,
    pub max: Option<u16>,
    /// Use the span of years present in the database instead of min/max.
    pub observed: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RankingConfig {
    pub song_weight: Option<f64>,
    pub popularity_weight: Option<f64>,
    pub default_k: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
