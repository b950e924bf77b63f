use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::model::UserRecord;

/// Forecast service credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_url")]
    pub base_url: String,
    pub service_key: String,
}

fn default_forecast_url() -> String {
    "http://apis.data.go.kr/1360000/VilageFcstInfoService_2.0".to_string()
}

/// Push service credentials and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_endpoint")]
    pub endpoint: String,
    pub server_key: String,
}

fn default_push_endpoint() -> String {
    crate::push::fcm::DEFAULT_ENDPOINT.to_string()
}

/// Scheduler timing. The time zone is explicit configuration, never an
/// ambient environment default: minute matching silently fails everywhere if
/// the zone is wrong, so it has to be visible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

fn default_utc_offset_hours() -> i32 {
    9
}

fn default_tick_secs() -> u64 {
    60
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            tick_secs: default_tick_secs(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [forecast]
/// service_key = "..."
///
/// [push]
/// server_key = "..."
///
/// [scheduler]
/// utc_offset_hours = 9
///
/// [[users]]
/// id = "u1"
/// [users.settings]
/// notification_enabled = true
/// notification_time = "07:30:00"
/// fcm_token = "..."
/// location_latitude = 37.5665
/// location_longitude = 126.978
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub forecast: Option<ForecastConfig>,
    pub push: Option<PushConfig>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl Config {
    /// Load config from the platform config directory, or return an empty
    /// default if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wnotify", "wnotify")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn forecast(&self) -> Result<&ForecastConfig> {
        self.forecast.as_ref().ok_or_else(|| {
            anyhow!(
                "No forecast service configured.\n\
                 Hint: add a [forecast] section with a service_key to the config file."
            )
        })
    }

    pub fn push(&self) -> Result<&PushConfig> {
        self.push.as_ref().ok_or_else(|| {
            anyhow!(
                "No push service configured.\n\
                 Hint: add a [push] section with a server_key to the config file."
            )
        })
    }

    /// The configured scheduler time zone as a fixed offset.
    pub fn timezone(&self) -> Result<FixedOffset> {
        let hours = self.scheduler.utc_offset_hours;
        FixedOffset::east_opt(hours * 3600)
            .ok_or_else(|| anyhow!("utc_offset_hours out of range: {hours}"))
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_secs)
    }
}
