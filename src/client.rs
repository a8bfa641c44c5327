//! Client implementation for the fan profile application

use crate::{
    args::{Commands, ProfileCommands},
    errors::{FanProfileError, Result},
    presentation::{FanRecord, TemperatureRecord},
};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use zbus::{dbus_proxy, Connection};

#[dbus_proxy(
    interface = "io.github.FanProfileDaemon",
    default_service = "io.github.FanProfileDaemon",
    default_path = "/io/github/FanProfileDaemon"
)]
trait FanProfileService {
    fn list_temperatures(&self) -> zbus::Result<HashMap<String, TemperatureRecord>>;

    fn get_temperature(&self, name: &str) -> zbus::Result<TemperatureRecord>;

    fn list_fans(&self) -> zbus::Result<HashMap<String, FanRecord>>;

    fn get_fan(&self, name: &str) -> zbus::Result<FanRecord>;

    fn list_profiles(&self) -> zbus::Result<Vec<String>>;

    fn get_active_profile(&self) -> zbus::Result<String>;

    fn set_active_profile(&self, name: &str) -> zbus::Result<()>;
}

/// Client for communicating with the fan profile daemon
pub struct FanProfileClient {
    proxy: FanProfileServiceProxy<'static>,
}

impl FanProfileClient {
    /// Connect to the daemon on the system bus, or the session bus if asked
    pub async fn new(session_bus: bool) -> Result<Self> {
        let connection = if session_bus {
            Connection::session().await?
        } else {
            Connection::system().await?
        };
        let proxy = FanProfileServiceProxy::new(&connection).await?;

        Ok(Self { proxy })
    }

    /// Handle a client command
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Daemon { .. } => Err(FanProfileError::Config(
                "daemon command should not be handled by client".to_string(),
            )),
            Commands::Temps { name: Some(name) } => {
                debug!("Getting temp sensor {}", name);
                print_json(&self.proxy.get_temperature(&name).await?)
            }
            Commands::Temps { name: None } => {
                debug!("Listing temp sensors");
                let temps: BTreeMap<_, _> = self.proxy.list_temperatures().await?.into_iter().collect();
                print_json(&temps)
            }
            Commands::Fans { name: Some(name) } => {
                debug!("Getting fan sensor {}", name);
                print_json(&self.proxy.get_fan(&name).await?)
            }
            Commands::Fans { name: None } => {
                debug!("Listing fan sensors");
                let fans: BTreeMap<_, _> = self.proxy.list_fans().await?.into_iter().collect();
                print_json(&fans)
            }
            Commands::Profile { command } => self.handle_profile_command(command).await,
        }
    }

    async fn handle_profile_command(&self, command: ProfileCommands) -> Result<()> {
        match command {
            ProfileCommands::List => {
                let active = self.proxy.get_active_profile().await?;
                for name in self.proxy.list_profiles().await? {
                    let marker = if name == active { "*" } else { " " };
                    println!("{} {}", marker, name);
                }
            }
            ProfileCommands::Get => {
                println!("{}", self.proxy.get_active_profile().await?);
            }
            ProfileCommands::Set { name } => {
                debug!("Setting active profile to {}", name);
                self.proxy.set_active_profile(&name).await?;
                println!("Active profile set to: {}", name);
            }
        }
        Ok(())
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
