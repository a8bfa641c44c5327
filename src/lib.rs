//! Fan Profile Daemon
//!
//! Discovers hwmon temperature and fan sensors, samples them periodically and
//! drives fan outputs from a configured profile. State is exposed over DBus.

pub mod args;
pub mod client;
pub mod config;
pub mod daemon;
pub mod discovery;
pub mod errors;
pub mod logging;
pub mod presentation;
pub mod profile;
pub mod registry;
pub mod scheduler;
pub mod sensors;
pub mod sysfs;

#[cfg(test)]
mod test_utils;

// DBus constants
pub const DBUS_SERVICE_NAME: &str = "io.github.FanProfileDaemon";
pub const DBUS_OBJECT_PATH: &str = "/io/github/FanProfileDaemon";

// Re-export commonly used types
pub use config::{Config, ProfileSettings};
pub use errors::{FanProfileError, Result};
pub use profile::Profile;
pub use registry::Registry;
