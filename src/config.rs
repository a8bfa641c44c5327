//! Daemon configuration
//!
//! The configuration is a TOML document naming the active profile and the
//! available profiles:
//!
//! ```toml
//! active_profile = "auto"
//!
//! [profiles.auto]
//! manual = true
//! speed = 0
//! high_temp = 80000
//! low_temp = 40000
//! ```
//!
//! Temperatures are compared against raw sensor readings, so they use the
//! device-native unit (millidegrees for hwmon).

use crate::errors::{FanProfileError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/fan-profile-daemon/config.toml";
pub const DEFAULT_ROOT: &str = "/sys/devices";
pub const DEFAULT_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_PRIMARY_SENSOR: &str = "Package id 0";

/// Settings of one named profile as written in the configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSettings {
    /// Force the fan into manual mode
    pub manual: bool,
    /// Fixed output; `0` derives the output from temperature, negative means full speed
    pub speed: i64,
    pub high_temp: i64,
    pub low_temp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub active_profile: String,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileSettings>,
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_primary_sensor")]
    pub primary_sensor: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_ROOT)
}

fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_primary_sensor() -> String {
    DEFAULT_PRIMARY_SENSOR.to_string()
}

impl Config {
    /// Load and validate the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| FanProfileError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(FanProfileError::Config(
                "interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.primary_sensor.is_empty() {
            return Err(FanProfileError::Config(
                "primary_sensor must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&ProfileSettings> {
        self.profiles
            .get(name)
            .ok_or_else(|| FanProfileError::UnknownProfile(name.to_string()))
    }

    /// Settings of the active profile
    pub fn active(&self) -> Result<&ProfileSettings> {
        self.profile(&self.active_profile)
    }

    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
