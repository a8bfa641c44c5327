//! Error types for the fan profile daemon

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the fan profile daemon
pub type Result<T> = std::result::Result<T, FanProfileError>;

/// Main error type for the fan profile daemon
#[derive(Error, Debug)]
pub enum FanProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid integer {value:?} in {path}")]
    Parse { path: PathBuf, value: String },

    #[error("Not a sensor label file: {0}")]
    InvalidLabelPath(PathBuf),

    #[error("Discovery root not found: {0}")]
    DiscoveryRootMissing(PathBuf),

    #[error("Duplicated {kind} sensor name: {name}")]
    DuplicateName { kind: SensorKind, name: String },

    #[error("High temp {high_temp} and low temp {low_temp} are not valid")]
    InvalidProfileBounds { high_temp: i64, low_temp: i64 },

    #[error("No such profile {0:?}")]
    UnknownProfile(String),

    #[error("Primary temperature sensor {0:?} not found")]
    MissingPrimarySensor(String),

    #[error("{kind} sensor could not be found: {name}")]
    SensorNotFound { kind: SensorKind, name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration syntax error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("DBus error: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Fan scheduler is not running")]
    SchedulerStopped,
}

/// The two sensor families tracked by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Fan,
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Temperature => f.write_str("Temp"),
            SensorKind::Fan => f.write_str("Fan"),
        }
    }
}

impl FanProfileError {
    /// Whether the error is a lookup of an unknown sensor or profile name
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FanProfileError::SensorNotFound { .. } | FanProfileError::UnknownProfile(_)
        )
    }
}

/// Helper function to convert display errors to zbus errors
pub fn zbus_error_from_display(err: impl std::fmt::Display) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(format!("{}", err))
}

/// Map a daemon error onto the DBus error a client should see
pub fn to_fdo_error(err: FanProfileError) -> zbus::fdo::Error {
    if err.is_not_found() {
        zbus::fdo::Error::UnknownObject(err.to_string())
    } else {
        zbus_error_from_display(err)
    }
}
