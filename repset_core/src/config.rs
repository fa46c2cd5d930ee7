//! Configuration file support for Repset.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/repset/config.toml`. Every
//! section is optional.

use crate::catalog::default_timer_templates;
use crate::types::TimerTemplate;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub timer: TimerConfig,
}

/// Local state storage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Workout history backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Bundled REST server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Timer periods and user-defined interval templates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_stopwatch_refresh_ms")]
    pub stopwatch_refresh_ms: u64,

    #[serde(default)]
    pub templates: Vec<TimerTemplate>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            stopwatch_refresh_ms: default_stopwatch_refresh_ms(),
            templates: Vec::new(),
        }
    }
}

impl TimerConfig {
    /// Interval timer tick period; every tick counts down one second
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn stopwatch_refresh(&self) -> Duration {
        Duration::from_millis(self.stopwatch_refresh_ms.max(1))
    }

    /// Built-in templates followed by the configured ones
    pub fn all_templates(&self) -> Vec<TimerTemplate> {
        let mut all = default_timer_templates();
        all.extend(self.templates.iter().cloned());
        all
    }

    /// Look up a template by id; configured templates shadow built-ins
    pub fn template(&self, id: &str) -> Option<TimerTemplate> {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .or_else(|| default_timer_templates().into_iter().find(|t| t.id == id))
    }
}

fn home_fallback(rel: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(rel))
        .unwrap_or_else(|| PathBuf::from(".").join(rel))
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| home_fallback(".local/share"))
        .join("repset")
}

fn default_base_url() -> String {
    "http://localhost:5000/api/workouts".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_bind() -> String {
    "0.0.0.0:5000".into()
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_stopwatch_refresh_ms() -> u64 {
    10
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| home_fallback(".config"))
            .join("repset")
            .join("config.toml")
    }

    /// Reject values the timers cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timer.tick_ms == 0 {
            return Err(Error::Config("timer.tick_ms must be positive".into()));
        }
        for t in &self.timer.templates {
            if t.work == 0 || t.rounds == 0 {
                return Err(Error::Config(format!(
                    "Timer template '{}' needs positive work seconds and rounds",
                    t.id
                )));
            }
        }
        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
