//! Daemon implementation for the fan profile application
//!
//! Startup mirrors the order the control loop depends on: configuration,
//! discovery, profile attachment, sampling loops, one immediate fan pass,
//! and only then the DBus service.

use crate::{
    config::Config,
    discovery::discover,
    errors::{to_fdo_error, FanProfileError, Result},
    presentation::{self, FanRecord, TemperatureRecord},
    registry::Registry,
    scheduler::{Notifier, Scheduler, SchedulerHandle},
    sysfs::{AttributeIo, Sysfs},
    DBUS_OBJECT_PATH, DBUS_SERVICE_NAME,
};
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::signal::unix::{signal, SignalKind};
use zbus::{dbus_interface, ConnectionBuilder, SignalContext};

/// Command line overrides for the daemon
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub config_path: PathBuf,
    pub root: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub session_bus: bool,
}

/// Main daemon structure, served on DBus
pub struct FanProfileDaemon {
    registry: Arc<Registry>,
    config: Config,
    active_profile: Mutex<String>,
    notifier: Notifier,
}

impl FanProfileDaemon {
    /// Discover sensors, attach the active profile and start the sampling loops.
    ///
    /// Every error returned here is fatal to startup.
    pub async fn start(config: Config, io: Arc<dyn AttributeIo>) -> Result<(Self, SchedulerHandle)> {
        let registry = Arc::new(discover(io.as_ref(), &config.root)?);

        let settings = config.active()?;
        let attached = registry.apply_profile(settings, &config.primary_sensor)?;
        info!(
            "Profile '{}' attached to {} fans",
            config.active_profile, attached
        );

        let (scheduler, notifier) = Scheduler::new(
            registry.clone(),
            io,
            config.interval(),
            config.primary_sensor.clone(),
        );
        let handle = scheduler.start();
        notifier.notify().await?;

        let daemon = Self {
            registry,
            active_profile: Mutex::new(config.active_profile.clone()),
            config,
            notifier,
        };
        Ok((daemon, handle))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn active_profile_name(&self) -> String {
        self.active_profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace every fan's profile with the named one and wake the fan loop.
    ///
    /// On error the previous profiles stay attached.
    pub async fn switch_profile(&self, name: &str) -> Result<usize> {
        let settings = self.config.profile(name)?;
        let attached = self
            .registry
            .apply_profile(settings, &self.config.primary_sensor)?;

        *self
            .active_profile
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = name.to_string();
        info!("Profile switched to '{}' for {} fans", name, attached);

        self.notifier.notify().await?;
        Ok(attached)
    }
}

#[dbus_interface(name = "io.github.FanProfileDaemon")]
impl FanProfileDaemon {
    /// Signal emitted after the active profile has been replaced
    #[dbus_interface(signal)]
    async fn active_profile_changed(signal_ctx: &SignalContext<'_>, name: &str) -> zbus::Result<()>;

    #[dbus_interface(out_args("temperatures"))]
    async fn list_temperatures(&self) -> HashMap<String, TemperatureRecord> {
        debug!("Listing temp sensors");
        presentation::list_temperatures(&self.registry)
    }

    #[dbus_interface(out_args("temperature"))]
    async fn get_temperature(&self, name: &str) -> zbus::fdo::Result<TemperatureRecord> {
        debug!("Getting temp sensor {}", name);
        presentation::get_temperature(&self.registry, name).map_err(to_fdo_error)
    }

    #[dbus_interface(out_args("fans"))]
    async fn list_fans(&self) -> HashMap<String, FanRecord> {
        debug!("Listing fan sensors");
        presentation::list_fans(&self.registry)
    }

    #[dbus_interface(out_args("fan"))]
    async fn get_fan(&self, name: &str) -> zbus::fdo::Result<FanRecord> {
        debug!("Getting fan sensor {}", name);
        presentation::get_fan(&self.registry, name).map_err(to_fdo_error)
    }

    #[dbus_interface(out_args("profiles"))]
    async fn list_profiles(&self) -> Vec<String> {
        self.config.profile_names()
    }

    #[dbus_interface(out_args("profile"))]
    async fn get_active_profile(&self) -> String {
        self.active_profile_name()
    }

    async fn set_active_profile(
        &self,
        name: &str,
        #[zbus(signal_context)] ctxt: SignalContext<'_>,
    ) -> zbus::fdo::Result<()> {
        debug!("Setting active profile to {}", name);
        self.switch_profile(name).await.map_err(to_fdo_error)?;
        Self::active_profile_changed(&ctxt, name).await?;
        Ok(())
    }
}

/// Load the configuration and apply command line overrides
pub fn load_config(options: &DaemonOptions) -> Result<Config> {
    let mut config = Config::load(&options.config_path)?;
    if let Some(root) = &options.root {
        config.root = root.clone();
    }
    if let Some(interval) = options.interval_secs {
        if interval == 0 {
            return Err(FanProfileError::Config(
                "interval must be greater than zero".to_string(),
            ));
        }
        config.interval_secs = interval;
    }
    Ok(config)
}

async fn wait_for_signal() -> Result<&'static str> {
    let mut int = signal(SignalKind::interrupt())?;
    let mut term = signal(SignalKind::terminate())?;

    let sig = tokio::select! {
        _ = int.recv() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    };
    Ok(sig)
}

/// Run the daemon until SIGINT or SIGTERM
pub async fn run(options: DaemonOptions) -> Result<()> {
    info!("Starting fan profile daemon");
    let config = load_config(&options)?;
    info!(
        "Using device root {} and primary sensor '{}'",
        config.root.display(),
        config.primary_sensor
    );

    let (daemon, scheduler) = FanProfileDaemon::start(config, Arc::new(Sysfs)).await?;

    let builder = if options.session_bus {
        ConnectionBuilder::session()?
    } else {
        ConnectionBuilder::system()?
    };
    let _connection = builder
        .name(DBUS_SERVICE_NAME)?
        .serve_at(DBUS_OBJECT_PATH, daemon)?
        .build()
        .await?;

    info!("Daemon started, listening on DBus as {}", DBUS_SERVICE_NAME);

    let sig = wait_for_signal().await?;
    info!("caught signal: {}", sig);

    scheduler.stop().await;
    info!("daemon exited from loop");
    Ok(())
}
