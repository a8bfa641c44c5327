//! Read-only projection of the registry
//!
//! Records are plain serde/zvariant structs so the same values can travel
//! over DBus and be printed as JSON by the client.

use crate::errors::Result;
use crate::registry::Registry;
use crate::sensors::{FanSensor, TemperatureSensor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zvariant::Type;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct TemperatureRecord {
    pub name: String,
    pub label_path: String,
    pub input_path: String,
    pub value: i64,
    pub sampled_at: String,
}

impl From<&TemperatureSensor> for TemperatureRecord {
    fn from(sensor: &TemperatureSensor) -> Self {
        Self {
            name: sensor.name.clone(),
            label_path: sensor.label_path.display().to_string(),
            input_path: sensor.input_path.display().to_string(),
            value: sensor.value,
            sampled_at: sensor.sampled_at.to_rfc3339(),
        }
    }
}

/// Profile attached to a fan; `attached` is false when the fan is uncontrolled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Type)]
pub struct ProfileRecord {
    pub attached: bool,
    pub manual: bool,
    pub speed: i64,
    pub k: f64,
    pub c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct FanRecord {
    pub name: String,
    pub label_path: String,
    pub input: i64,
    pub manual: i64,
    pub max: i64,
    pub min: i64,
    pub output: i64,
    pub safe: i64,
    pub sampled_at: String,
    pub profile: ProfileRecord,
}

impl From<&FanSensor> for FanRecord {
    fn from(sensor: &FanSensor) -> Self {
        let profile = sensor
            .profile()
            .map(|p| {
                let (k, c) = p.coefficients();
                ProfileRecord {
                    attached: true,
                    manual: p.manual(),
                    speed: p.speed(),
                    k,
                    c,
                }
            })
            .unwrap_or_default();

        Self {
            name: sensor.name.clone(),
            label_path: sensor.paths.label.display().to_string(),
            input: sensor.readings.input,
            manual: sensor.readings.manual,
            max: sensor.readings.max,
            min: sensor.readings.min,
            output: sensor.readings.output,
            safe: sensor.readings.safe,
            sampled_at: sensor.sampled_at.to_rfc3339(),
            profile,
        }
    }
}

pub fn list_temperatures(registry: &Registry) -> HashMap<String, TemperatureRecord> {
    registry
        .temperatures()
        .iter()
        .map(|(name, sensor)| (name.clone(), sensor.into()))
        .collect()
}

pub fn get_temperature(registry: &Registry, name: &str) -> Result<TemperatureRecord> {
    registry.temperature(name).map(|sensor| (&sensor).into())
}

pub fn list_fans(registry: &Registry) -> HashMap<String, FanRecord> {
    registry
        .fans()
        .iter()
        .map(|(name, sensor)| (name.clone(), sensor.into()))
        .collect()
}

pub fn get_fan(registry: &Registry, name: &str) -> Result<FanRecord> {
    registry.fan(name).map(|sensor| (&sensor).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileSettings;
    use crate::discovery::discover;
    use crate::sysfs::Sysfs;
    use crate::test_utils::FakeTree;

    fn registry() -> (FakeTree, Registry) {
        let tree = FakeTree::new();
        tree.temp("coretemp", 1, "Package id 0", 52000);
        tree.fan("applesmc", 1, "Left side", 2000, 6000);
        tree.fan("applesmc", 2, "Right side", 1800, 5500);
        let registry = discover(&Sysfs, tree.root()).unwrap();
        (tree, registry)
    }

    #[test]
    fn test_list_records() {
        let (_tree, registry) = registry();

        let temps = list_temperatures(&registry);
        assert_eq!(temps.len(), 1);
        assert_eq!(temps["Package id 0"].value, 52000);
        assert!(temps["Package id 0"].input_path.ends_with("temp1_input"));

        let fans = list_fans(&registry);
        assert_eq!(fans.len(), 2);
        assert_eq!(fans["Right side"].min, 1800);
        assert!(!fans["Right side"].profile.attached);
    }

    #[test]
    fn test_fan_record_shows_profile() {
        let (_tree, registry) = registry();
        registry
            .apply_profile(
                &ProfileSettings {
                    manual: true,
                    speed: 3500,
                    ..ProfileSettings::default()
                },
                "Package id 0",
            )
            .unwrap();

        let record = get_fan(&registry, "Left side").unwrap();
        assert_eq!(
            record.profile,
            ProfileRecord {
                attached: true,
                manual: true,
                speed: 3500,
                k: 0.0,
                c: 0.0,
            }
        );
    }

    #[test]
    fn test_unknown_names_are_not_found() {
        let (_tree, registry) = registry();
        assert!(get_fan(&registry, "Middle").unwrap_err().is_not_found());
        assert!(get_temperature(&registry, "TC0P").unwrap_err().is_not_found());
    }

    #[test]
    fn test_records_serialize_to_json() {
        let (_tree, registry) = registry();
        let record = get_temperature(&registry, "Package id 0").unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Package id 0");
        assert_eq!(json["value"], 52000);
    }
}
