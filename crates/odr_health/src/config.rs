//! Configuration for the health check.
//!
//! Loads settings from /etc/odr/health.toml or uses defaults.

use odr_shared::{DEFAULT_BASE_URL, EXPECTED_SAMPLE_RATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/odr/health.toml";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "ODR_HEALTH_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Where the modulator web API lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Client-side request timeout. Absent means a hung request stalls its probe.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

/// Probe thresholds and timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Delay between the two frame counter samples
    #[serde(default = "default_frame_recheck_delay")]
    pub frame_recheck_delay_ms: u64,

    /// Rounds after the baseline sample for the underrun/late packet counters
    #[serde(default = "default_counter_rounds")]
    pub counter_rounds: u32,

    /// Delay between counter samples
    #[serde(default = "default_counter_interval")]
    pub counter_interval_ms: u64,

    /// The GPSDO must use strictly more satellites than this
    #[serde(default = "default_min_gpsdo_satellites")]
    pub min_gpsdo_satellites: i64,

    #[serde(default = "default_expected_sample_rate")]
    pub expected_sample_rate: i64,
}

fn default_frame_recheck_delay() -> u64 {
    200
}

fn default_counter_rounds() -> u32 {
    3
}

fn default_counter_interval() -> u64 {
    2_000
}

fn default_min_gpsdo_satellites() -> i64 {
    3
}

fn default_expected_sample_rate() -> i64 {
    EXPECTED_SAMPLE_RATE
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            frame_recheck_delay_ms: default_frame_recheck_delay(),
            counter_rounds: default_counter_rounds(),
            counter_interval_ms: default_counter_interval(),
            min_gpsdo_satellites: default_min_gpsdo_satellites(),
            expected_sample_rate: default_expected_sample_rate(),
        }
    }
}

impl CheckConfig {
    pub fn frame_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.frame_recheck_delay_ms)
    }

    pub fn counter_interval(&self) -> Duration {
        Duration::from_millis(self.counter_interval_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub checks: CheckConfig,
}

impl HealthConfig {
    /// Load from an explicit path, `$ODR_HEALTH_CONFIG`, or the system path.
    /// A missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_ENV).ok();
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env_path.map(Into::into))
            .unwrap_or_else(|| CONFIG_PATH.into());

        if !path.exists() {
            if explicit.is_some() {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
                });
            }
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: HealthConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("device.base_url must not be empty".into()));
        }
        if self.checks.counter_rounds == 0 {
            return Err(ConfigError::Invalid("checks.counter_rounds must be at least 1".into()));
        }
        if self.device.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "device.request_timeout_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }
}
