//! Application settings
//!
//! Serial receiver, repeat timing and mouse acceleration, stored as TOML.
//! Every field has a default so a partial (or missing) file is fine.

use irplus_engine::{RampConfig, Timing};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Serial receiver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Explicit port path (e.g. `/dev/ttyUSB0`); skips discovery when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Substring matched against the USB product/manufacturer string
    #[serde(default = "default_description_match")]
    pub description_match: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Read timeout; bounds how long a stop request can take
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

fn default_description_match() -> String {
    "Arduino".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout() -> u64 {
    100
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            description_match: default_description_match(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Repeat thresholds in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_threshold")]
    pub threshold_ms: u64,
    #[serde(default = "default_typing_threshold")]
    pub typing_threshold_ms: u64,
    #[serde(default = "default_click_threshold")]
    pub click_threshold_ms: u64,
}

fn default_threshold() -> u64 {
    Timing::default().threshold_ms
}
fn default_typing_threshold() -> u64 {
    Timing::default().typing_threshold_ms
}
fn default_click_threshold() -> u64 {
    Timing::default().click_threshold_ms
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_threshold(),
            typing_threshold_ms: default_typing_threshold(),
            click_threshold_ms: default_click_threshold(),
        }
    }
}

impl From<&TimingConfig> for Timing {
    fn from(cfg: &TimingConfig) -> Self {
        Timing {
            threshold_ms: cfg.threshold_ms,
            typing_threshold_ms: cfg.typing_threshold_ms,
            click_threshold_ms: cfg.click_threshold_ms,
        }
    }
}

/// Mouse acceleration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MouseConfig {
    #[serde(default = "default_initial_speed")]
    pub initial_speed: i32,
    #[serde(default = "default_acceleration")]
    pub acceleration: i32,
    #[serde(default = "default_max_speed")]
    pub max_speed: i32,
    #[serde(default = "default_stop_threshold")]
    pub stop_threshold_ms: u64,
}

fn default_initial_speed() -> i32 {
    RampConfig::default().initial_speed
}
fn default_acceleration() -> i32 {
    RampConfig::default().acceleration
}
fn default_max_speed() -> i32 {
    RampConfig::default().max_speed
}
fn default_stop_threshold() -> u64 {
    RampConfig::default().stop_threshold_ms
}

impl Default for MouseConfig {
    fn default() -> Self {
        Self {
            initial_speed: default_initial_speed(),
            acceleration: default_acceleration(),
            max_speed: default_max_speed(),
            stop_threshold_ms: default_stop_threshold(),
        }
    }
}

impl From<&MouseConfig> for RampConfig {
    fn from(cfg: &MouseConfig) -> Self {
        RampConfig {
            initial_speed: cfg.initial_speed,
            acceleration: cfg.acceleration,
            max_speed: cfg.max_speed,
            stop_threshold_ms: cfg.stop_threshold_ms,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name for the virtual input device
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub mouse: MouseConfig,
}

fn default_device_name() -> String {
    "IR+ Virtual Input".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            serial: SerialConfig::default(),
            timing: TimingConfig::default(),
            mouse: MouseConfig::default(),
        }
    }
}

impl AppConfig {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the resolver cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timing.typing_threshold_ms >= self.timing.threshold_ms {
            anyhow::bail!(
                "timing.typing_threshold_ms ({}) must be below timing.threshold_ms ({})",
                self.timing.typing_threshold_ms,
                self.timing.threshold_ms
            );
        }
        if self.mouse.initial_speed <= 0 || self.mouse.max_speed < self.mouse.initial_speed {
            anyhow::bail!(
                "mouse speeds must satisfy 0 < initial_speed ({}) <= max_speed ({})",
                self.mouse.initial_speed,
                self.mouse.max_speed
            );
        }
        if self.serial.read_timeout_ms == 0 {
            anyhow::bail!("serial.read_timeout_ms must be non-zero");
        }
        Ok(())
    }

    pub fn timing(&self) -> Timing {
        Timing::from(&self.timing)
    }

    pub fn ramp(&self) -> RampConfig {
        RampConfig::from(&self.mouse)
    }
}

/// `~/.config/irplus`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("irplus")
}
