//! Process-wide sensor registry
//!
//! Temperature and fan sensors live in two name-keyed maps, each behind its
//! own read-write lock. The periodic passes are the only writers of sensor
//! values; everything else reads cloned snapshots. The two locks are never
//! held at the same time.

use crate::config::ProfileSettings;
use crate::errors::{FanProfileError, Result, SensorKind};
use crate::profile::Profile;
use crate::sensors::{FanSensor, TemperatureSensor};
use crate::sysfs::AttributeIo;
use chrono::{DateTime, Local};
use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Outcome of one sampling pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    pub refreshed: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct Registry {
    temperatures: RwLock<HashMap<String, TemperatureSensor>>,
    fans: RwLock<HashMap<String, FanSensor>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a temperature sensor. An existing sensor with the same name wins.
    pub fn insert_temperature(&self, sensor: TemperatureSensor) -> Result<()> {
        match write(&self.temperatures).entry(sensor.name.clone()) {
            Entry::Occupied(entry) => Err(FanProfileError::DuplicateName {
                kind: SensorKind::Temperature,
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(sensor);
                Ok(())
            }
        }
    }

    /// Add a fan sensor. An existing sensor with the same name wins.
    pub fn insert_fan(&self, sensor: FanSensor) -> Result<()> {
        match write(&self.fans).entry(sensor.name.clone()) {
            Entry::Occupied(entry) => Err(FanProfileError::DuplicateName {
                kind: SensorKind::Fan,
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(sensor);
                Ok(())
            }
        }
    }

    pub fn temperature(&self, name: &str) -> Result<TemperatureSensor> {
        read(&self.temperatures)
            .get(name)
            .cloned()
            .ok_or_else(|| FanProfileError::SensorNotFound {
                kind: SensorKind::Temperature,
                name: name.to_string(),
            })
    }

    pub fn temperatures(&self) -> HashMap<String, TemperatureSensor> {
        read(&self.temperatures).clone()
    }

    /// Last observed value of a temperature sensor
    pub fn temperature_value(&self, name: &str) -> Option<i64> {
        read(&self.temperatures).get(name).map(|s| s.value)
    }

    pub fn fan(&self, name: &str) -> Result<FanSensor> {
        read(&self.fans)
            .get(name)
            .cloned()
            .ok_or_else(|| FanProfileError::SensorNotFound {
                kind: SensorKind::Fan,
                name: name.to_string(),
            })
    }

    pub fn fans(&self) -> HashMap<String, FanSensor> {
        read(&self.fans).clone()
    }

    pub fn temperature_count(&self) -> usize {
        read(&self.temperatures).len()
    }

    pub fn fan_count(&self) -> usize {
        read(&self.fans).len()
    }

    /// Derive a profile for every fan from `settings` and swap them all in.
    ///
    /// Nothing is replaced unless every fan accepted the settings. Returns
    /// the number of fans that received a profile.
    pub fn apply_profile(&self, settings: &ProfileSettings, primary: &str) -> Result<usize> {
        if settings.manual && settings.speed == 0 && self.temperature_value(primary).is_none() {
            return Err(FanProfileError::MissingPrimarySensor(primary.to_string()));
        }

        let mut fans = write(&self.fans);
        let profiles = fans
            .iter()
            .map(|(name, fan)| {
                Profile::derive(settings, fan.readings.min, fan.readings.max)
                    .map(|profile| (name.clone(), profile))
            })
            .collect::<Result<Vec<_>>>()?;

        for (name, profile) in &profiles {
            if let Some(fan) = fans.get_mut(name) {
                debug!("{}: attaching profile {:?}", name, profile);
                fan.replace_profile(Some(*profile));
            }
        }

        Ok(profiles.len())
    }

    /// Re-read every temperature sensor.
    ///
    /// Files are read from a snapshot taken under the read lock; each result
    /// is committed under its own short write lock.
    pub fn sample_temperatures(&self, io: &dyn AttributeIo, now: DateTime<Local>) -> PassReport {
        let snapshot: Vec<TemperatureSensor> = read(&self.temperatures).values().cloned().collect();

        let mut report = PassReport::default();
        for mut sensor in snapshot {
            match sensor.refresh(io, now) {
                Ok(()) => {
                    if let Some(entry) = write(&self.temperatures).get_mut(&sensor.name) {
                        entry.value = sensor.value;
                        entry.sampled_at = sensor.sampled_at;
                    }
                    report.refreshed += 1;
                }
                Err(e) => {
                    warn!("update value for {} failed with error {}", sensor.name, e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Re-read every fan sensor and drive it from its profile.
    ///
    /// Register I/O runs on a snapshot outside the lock. Readings, including
    /// values written before a failure, are committed per fan.
    pub fn control_fans(
        &self,
        io: &dyn AttributeIo,
        now: DateTime<Local>,
        primary: &str,
    ) -> PassReport {
        let reference = self.temperature_value(primary);
        let snapshot: Vec<FanSensor> = read(&self.fans).values().cloned().collect();

        let mut report = PassReport::default();
        for mut fan in snapshot {
            if let Err(e) = fan.refresh(io, now) {
                warn!("update value for {} failed with error {}", fan.name, e);
                report.failed += 1;
                continue;
            }

            let result = fan.apply_profile(io, reference);
            if let Some(entry) = write(&self.fans).get_mut(&fan.name) {
                entry.readings = fan.readings;
                entry.sampled_at = fan.sampled_at;
            }

            match result {
                Ok(()) => report.refreshed += 1,
                Err(e) => {
                    warn!("update value for {} failed with error {}", fan.name, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}
