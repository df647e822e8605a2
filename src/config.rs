use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub sources: SourcesConfig,

    pub timeline: TimelineConfig,

    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Locations of the three tab-separated source files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub titles_path: PathBuf,

    pub ratings_path: PathBuf,

    pub links_path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            titles_path: PathBuf::from("title.basics.tsv"),
            ratings_path: PathBuf::from("title.ratings.tsv"),
            links_path: PathBuf::from("title.episode.tsv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Year substituted for missing release years. When unset, the year after
    /// the current one is used so unreleased titles land in the future.
    pub placeholder_year: Option<i32>,

    /// Default inclusive lower bound on the (parent) release year.
    pub min_year: i32,

    /// Default strict lower bound on the (parent) vote count.
    pub min_votes: u64,

    /// Default strict lower bound on the (parent) rating.
    pub min_rating: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            placeholder_year: None,
            min_year: 2018,
            min_votes: 20_000,
            min_rating: 7.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Max enriched catalogs held at once. Catalogs are large; a handful
    /// covers switching between a few snapshots.
    pub enriched_capacity: u64,

    /// Max spread timelines held at once. These are small subsets, so many
    /// filter variations can stay warm.
    pub spread_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enriched_capacity: 4,
            spread_capacity: 64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            sources: SourcesConfig::default(),
            timeline: TimelineConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("yearline").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".yearline").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.timeline.min_rating) {
            anyhow::bail!("timeline.min_rating must be between 0 and 10");
        }

        if self.cache.enriched_capacity == 0 || self.cache.spread_capacity == 0 {
            anyhow::bail!("Cache capacities must be > 0");
        }

        Ok(())
    }
}
