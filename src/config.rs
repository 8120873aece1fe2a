use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::*;
use crate::error::{PipelineError, Result};
use crate::pipeline::{JoinStrategy, PipelineConfig};

pub const CONFIG_FILE: &str = "kiddos.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_root: PathBuf,
    pub stem: String,
    pub log_dir: PathBuf,
    pub catalog_file: String,
    pub score_dir: String,
    pub issue_matching_file: String,
    pub trend_file: String,
    pub key_extensions: Vec<String>,
    pub join_strategy: JoinStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            stem: DEFAULT_STEM.to_string(),
            log_dir: PathBuf::from("logs"),
            catalog_file: CATALOG_FILE.to_string(),
            score_dir: SCORE_DIR.to_string(),
            issue_matching_file: ISSUE_MATCHING_FILE.to_string(),
            trend_file: TREND_FILE.to_string(),
            key_extensions: DEFAULT_KEY_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            join_strategy: JoinStrategy::default(),
        }
    }
}

impl Config {
    /// Load `kiddos.toml` from the working directory (defaults when absent),
    /// then apply `.env` and `KIDDOS_*` environment overrides.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        let mut config = Self::load_file(Path::new(CONFIG_FILE))?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a config file; a missing file yields the defaults.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("KIDDOS_DATA_ROOT").filter(|v| !v.is_empty()) {
            self.data_root = PathBuf::from(root);
        }
        if let Some(stem) = lookup("KIDDOS_STEM").filter(|v| !v.is_empty()) {
            self.stem = stem;
        }
        if let Some(strategy) = lookup("KIDDOS_JOIN_STRATEGY").filter(|v| !v.is_empty()) {
            self.join_strategy = strategy.parse()?;
        }
        Ok(())
    }

    pub fn trend_path(&self) -> PathBuf {
        self.data_root.join(&self.trend_file)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_root: self.data_root.clone(),
            catalog_file: self.catalog_file.clone(),
            score_dir: self.score_dir.clone(),
            issue_matching_file: self.issue_matching_file.clone(),
            key_extensions: self.key_extensions.clone(),
            join_strategy: self.join_strategy,
        }
    }
}
