// src/config.rs
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::timeline::{ChunkOrder, DAY_SECS};

// --- ENVIRONMENT OVERRIDES ---
pub const ENV_API_URL: &str = "REVIEW_SYNC_API_URL";
pub const ENV_CHUNK_SECS: &str = "REVIEW_SYNC_CHUNK_SECS";
pub const ENV_LOG: &str = "REVIEW_SYNC_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// --- DATA STRUCTURES ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    /// Length of one recording chunk. Must divide a day evenly.
    pub chunk_duration_secs: u32,
    /// How far the scrub head may leave the loaded chunk before re-anchoring.
    pub scrub_tolerance_secs: f64,
    pub segment_duration_secs: u32,
    pub timestamp_spread_secs: u32,
    pub chunk_order: ChunkOrder,
    /// Offset of the local day from UTC, in seconds east.
    pub utc_offset_secs: i32,
    pub hide_future_chunks: bool,
    pub api_base_url: String,
    pub log_level: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: 3600,
            scrub_tolerance_secs: 60.0,
            segment_duration_secs: 30,
            timestamp_spread_secs: 15,
            chunk_order: ChunkOrder::default(),
            utc_offset_secs: 0,
            hide_future_chunks: true,
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ReviewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let day = DAY_SECS as u32;
        if self.chunk_duration_secs == 0 || day % self.chunk_duration_secs != 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_duration_secs",
                reason: format!("{} does not divide a day evenly", self.chunk_duration_secs),
            });
        }
        if !(self.scrub_tolerance_secs >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "scrub_tolerance_secs",
                reason: "must be zero or positive".to_string(),
            });
        }
        if self.segment_duration_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "segment_duration_secs",
                reason: "must be positive".to_string(),
            });
        }
        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_secs).ok_or_else(|| ConfigError::Invalid {
            field: "utc_offset_secs",
            reason: format!("{} is outside ±24h", self.utc_offset_secs),
        })
    }

    /// Motion buckets are half a timeline segment wide.
    pub fn motion_scale(&self) -> u32 {
        (self.segment_duration_secs / 2).max(1)
    }

    /// Applies `REVIEW_SYNC_*` variables from the process environment (and `.env`).
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        dotenv::dotenv().ok();

        if let Ok(url) = std::env::var(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Ok(secs) = std::env::var(ENV_CHUNK_SECS) {
            self.chunk_duration_secs = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "chunk_duration_secs",
                reason: format!("{}={} is not a number", ENV_CHUNK_SECS, secs),
            })?;
        }
        if let Ok(level) = std::env::var(ENV_LOG) {
            self.log_level = level;
        }
        Ok(())
    }
}

// --- MANAGER ---

pub struct ConfigManager {
    config: Mutex<ReviewConfig>,
    file_path: Option<PathBuf>,
    from_file: bool,
}

impl ConfigManager {
    /// Loads `path` if it exists, falling back to defaults when it does not,
    /// then applies the environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::read(path.as_ref(), true)
    }

    /// Like `load`, without looking at the environment or `.env`.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::read(path.as_ref(), false)
    }

    fn read(path: &Path, with_env: bool) -> Result<Self, ConfigError> {
        let from_file = path.exists();
        let mut config = if from_file {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&content)?
        } else {
            ReviewConfig::default()
        };

        if with_env {
            config.apply_env_overrides()?;
        }
        config.validate()?;

        Ok(Self {
            config: Mutex::new(config),
            file_path: Some(path.to_path_buf()),
            from_file,
        })
    }

    pub fn new_in_memory() -> Self {
        Self::with_config(ReviewConfig::default())
    }

    pub fn with_config(config: ReviewConfig) -> Self {
        Self {
            config: Mutex::new(config),
            file_path: None,
            from_file: false,
        }
    }

    /// False when the config file was missing and defaults were used.
    pub fn loaded_from_file(&self) -> bool {
        self.from_file
    }

    pub fn get(&self) -> ReviewConfig {
        match self.config.lock() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Validates and stores `config`, then writes it out when file backed.
    pub fn update(&self, config: ReviewConfig) -> Result<(), ConfigError> {
        config.validate()?;
        match self.config.lock() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        self.save()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.get())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })
    }
}
