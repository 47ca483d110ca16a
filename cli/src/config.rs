use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use heft_core::projection::ProjectionPolicy;
use heft_core::tips::{CadenceFallback, NoFallback, RandomFallback, TipFallback};

pub const DB_ENV: &str = "HEFT_DB";

/// How the hydration tip is shown when no rule matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationTips {
    #[default]
    Random,
    Always,
    Never,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    db_path: Option<PathBuf>,
    weekly_rate_lbs: Option<f64>,
    hydration_tips: HydrationTips,
}

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub policy: ProjectionPolicy,
    pub hydration_tips: HydrationTips,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "heft").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let config_path = proj_dirs.config_dir().join("config.toml");
        let db_override = std::env::var_os(DB_ENV).map(PathBuf::from);

        Self::resolve(&data_dir, &config_path, db_override)
    }

    fn resolve(data_dir: &Path, config_path: &Path, db_override: Option<PathBuf>) -> Result<Self> {
        let file = read_file_config(config_path)?;

        let policy = match file.weekly_rate_lbs {
            Some(rate) => ProjectionPolicy::new(rate)
                .with_context(|| format!("Invalid weekly_rate_lbs in {}", config_path.display()))?,
            None => ProjectionPolicy::default(),
        };

        let db_path = db_override
            .or(file.db_path)
            .unwrap_or_else(|| data_dir.join("heft.db"));
        tracing::debug!(db = %db_path.display(), "configuration resolved");

        Ok(Config {
            db_path,
            policy,
            hydration_tips: file.hydration_tips,
        })
    }

    /// Apply a `--weekly-rate` flag on top of whatever the config file set.
    pub fn with_weekly_rate(mut self, rate: Option<f64>) -> Result<Self> {
        if let Some(rate) = rate {
            self.policy = ProjectionPolicy::new(rate).context("Invalid --weekly-rate")?;
        }
        Ok(self)
    }

    pub fn tip_fallback(&self) -> Box<dyn TipFallback> {
        match self.hydration_tips {
            HydrationTips::Random => Box::new(RandomFallback::new()),
            HydrationTips::Always => Box::new(CadenceFallback::new(1)),
            HydrationTips::Never => Box::new(NoFallback),
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
