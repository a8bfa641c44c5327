//! Command line argument parsing for the fan profile application

use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fan Profile Daemon
///
/// Samples hwmon temperature and fan sensors and drives fans from a configured profile.
#[derive(Parser, Debug)]
#[command(name = "fan-profile-daemon")]
#[command(about = "Profile-driven fan control daemon")]
#[command(version)]
pub struct Args {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use the session bus instead of the system bus
    #[arg(long, global = true)]
    pub session: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the daemon
    Daemon {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Override the device tree scanned for sensors
        #[arg(long)]
        root: Option<PathBuf>,
        /// Override the sampling interval in seconds
        #[arg(long)]
        interval: Option<u64>,
        /// Also write log lines to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Show temperature sensors
    Temps {
        /// Sensor name; all sensors when omitted
        name: Option<String>,
    },
    /// Show fan sensors
    Fans {
        /// Sensor name; all sensors when omitted
        name: Option<String>,
    },
    /// Profile management
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProfileCommands {
    /// List configured profiles
    List,
    /// Get the active profile
    Get,
    /// Switch the active profile
    Set {
        /// Name of the profile to activate
        name: String,
    },
}
