use crate::DbError;
use crate::task::DEFAULT_PROGRESS_INTERVAL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Export format selected by default in the export dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultExportFormat {
    #[default]
    Csv,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,

    #[serde(default)]
    pub default_export_format: DefaultExportFormat,

    /// Maximum dialog width the host can show.
    #[serde(default = "default_display_width")]
    pub display_width: usize,

    #[serde(default = "default_min_value_width")]
    pub min_value_width: usize,

    /// `env_logger` filter used when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

fn default_display_width() -> usize {
    80
}

fn default_min_value_width() -> usize {
    40
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            progress_interval: default_progress_interval(),
            default_export_format: DefaultExportFormat::default(),
            display_width: default_display_width(),
            min_value_width: default_min_value_width(),
            log_filter: None,
        }
    }
}

pub struct AppConfigStore {
    path: PathBuf,
}

impl AppConfigStore {
    pub fn new() -> Result<Self, DbError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DbError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        let app_dir = config_dir.join("sqlpanel");
        fs::create_dir_all(&app_dir).map_err(DbError::IoError)?;

        Ok(Self {
            path: app_dir.join("config.json"),
        })
    }

    /// Store reading an explicit file (`--config <path>`).
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<AppConfig, DbError> {
        if !self.path.exists() {
            log::debug!("[CONFIG] {} not found, using defaults", self.path.display());
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(DbError::IoError)?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|e| DbError::InvalidConfig(e.to_string()))?;

        log::info!("[CONFIG] Loaded {}", self.path.display());
        Ok(config)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
