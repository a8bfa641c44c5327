//! Temperature and fan sensor records
//!
//! Each record remembers the attribute paths found at discovery and the last
//! values read from them. Paths never change after construction.

use crate::errors::{FanProfileError, Result};
use crate::profile::Profile;
use crate::sysfs::{sibling_path, AttributeIo};
use chrono::{DateTime, Local};
use log::info;
use std::path::{Path, PathBuf};

/// A temperature sensor (`tempN_label` + `tempN_input`)
#[derive(Debug, Clone)]
pub struct TemperatureSensor {
    pub name: String,
    pub label_path: PathBuf,
    pub input_path: PathBuf,
    pub value: i64,
    pub sampled_at: DateTime<Local>,
}

impl TemperatureSensor {
    /// Construct a sensor from its label file, reading the current value
    pub fn from_label(io: &dyn AttributeIo, label_path: &Path, now: DateTime<Local>) -> Result<Self> {
        let input_path = sibling_path(label_path, "input")?;
        let name = io.read_label(label_path)?;
        let value = io.read_int(&input_path)?;

        Ok(Self {
            name,
            label_path: label_path.to_path_buf(),
            input_path,
            value,
            sampled_at: now,
        })
    }

    /// Re-read the input file. On failure the previous value is kept.
    pub fn refresh(&mut self, io: &dyn AttributeIo, now: DateTime<Local>) -> Result<()> {
        self.value = io.read_int(&self.input_path)?;
        self.sampled_at = now;
        Ok(())
    }
}

/// Attribute files of a fan sensor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanPaths {
    pub label: PathBuf,
    pub input: PathBuf,
    pub manual: PathBuf,
    pub max: PathBuf,
    pub min: PathBuf,
    pub output: PathBuf,
    pub safe: PathBuf,
}

impl FanPaths {
    pub fn from_label(label_path: &Path) -> Result<Self> {
        Ok(Self {
            label: label_path.to_path_buf(),
            input: sibling_path(label_path, "input")?,
            manual: sibling_path(label_path, "manual")?,
            max: sibling_path(label_path, "max")?,
            min: sibling_path(label_path, "min")?,
            output: sibling_path(label_path, "output")?,
            safe: sibling_path(label_path, "safe")?,
        })
    }
}

/// Raw register values of a fan sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanReadings {
    pub input: i64,
    pub manual: i64,
    pub max: i64,
    pub min: i64,
    pub output: i64,
    pub safe: i64,
}

impl FanReadings {
    /// Read all six registers; nothing is returned unless every read succeeded
    pub fn read(io: &dyn AttributeIo, paths: &FanPaths) -> Result<Self> {
        Ok(Self {
            input: io.read_int(&paths.input)?,
            manual: io.read_int(&paths.manual)?,
            max: io.read_int(&paths.max)?,
            min: io.read_int(&paths.min)?,
            output: io.read_int(&paths.output)?,
            safe: io.read_int(&paths.safe)?,
        })
    }
}

/// A fan sensor and its optional control profile
#[derive(Debug, Clone)]
pub struct FanSensor {
    pub name: String,
    pub paths: FanPaths,
    pub readings: FanReadings,
    pub sampled_at: DateTime<Local>,
    profile: Option<Profile>,
}

impl FanSensor {
    /// Construct a sensor from its label file, reading all registers
    pub fn from_label(io: &dyn AttributeIo, label_path: &Path, now: DateTime<Local>) -> Result<Self> {
        let paths = FanPaths::from_label(label_path)?;
        let name = io.read_label(label_path)?;
        let readings = FanReadings::read(io, &paths)?;

        Ok(Self {
            name,
            paths,
            readings,
            sampled_at: now,
            profile: None,
        })
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Replace the attached profile, returning the previous one
    pub fn replace_profile(&mut self, profile: Option<Profile>) -> Option<Profile> {
        std::mem::replace(&mut self.profile, profile)
    }

    /// Refresh all registers and then drive the fan from its profile.
    ///
    /// `reference` is the current primary temperature, if one is known.
    pub fn update(
        &mut self,
        io: &dyn AttributeIo,
        now: DateTime<Local>,
        reference: Option<i64>,
    ) -> Result<()> {
        self.refresh(io, now)?;
        self.apply_profile(io, reference)
    }

    /// Re-read the six registers. On failure the previous readings are kept.
    pub fn refresh(&mut self, io: &dyn AttributeIo, now: DateTime<Local>) -> Result<()> {
        self.readings = FanReadings::read(io, &self.paths)?;
        self.sampled_at = now;
        Ok(())
    }

    /// Write the manual flag and output target demanded by the profile.
    ///
    /// Registers are only written when their value would change.
    pub fn apply_profile(&mut self, io: &dyn AttributeIo, reference: Option<i64>) -> Result<()> {
        let Some(profile) = self.profile else {
            return Ok(());
        };

        let manual = profile.manual_flag();
        if self.readings.manual != manual {
            io.write_int(&self.paths.manual, manual)?;
            self.readings.manual = manual;
        }

        if !profile.manual() {
            return Ok(());
        }

        let temperature = match reference {
            Some(value) => value,
            None if profile.follows_temperature() => {
                return Err(FanProfileError::MissingPrimarySensor(self.name.clone()))
            }
            None => 0,
        };

        let FanReadings { min, max, output, .. } = self.readings;
        if let Some(target) = profile.target(temperature, min, max) {
            if target != output {
                info!("{}: output {} -> {}", self.name, output, target);
                io.write_int(&self.paths.output, target)?;
                self.readings.output = target;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileSettings;
    use crate::sysfs::Sysfs;
    use crate::test_utils::{FakeTree, RecordingIo};
    use std::fs;

    fn linear() -> ProfileSettings {
        ProfileSettings {
            manual: true,
            speed: 0,
            high_temp: 80,
            low_temp: 40,
        }
    }

    #[test]
    fn test_temperature_from_label() {
        let tree = FakeTree::new();
        let label = tree.temp("coretemp", 1, "Package id 0", 45000);

        let sensor = TemperatureSensor::from_label(&Sysfs, &label, Local::now()).unwrap();
        assert_eq!(sensor.name, "Package id 0");
        assert_eq!(sensor.value, 45000);
        assert_eq!(sensor.input_path, label.with_file_name("temp1_input"));
    }

    #[test]
    fn test_temperature_refresh_failure_keeps_value() {
        let tree = FakeTree::new();
        let label = tree.temp("coretemp", 1, "Core 0", 41000);
        let mut sensor = TemperatureSensor::from_label(&Sysfs, &label, Local::now()).unwrap();
        let before = sensor.sampled_at;

        fs::write(&sensor.input_path, "garbage").unwrap();
        assert!(sensor.refresh(&Sysfs, Local::now()).is_err());
        assert_eq!(sensor.value, 41000);
        assert_eq!(sensor.sampled_at, before);

        fs::write(&sensor.input_path, "52000\n").unwrap();
        sensor.refresh(&Sysfs, Local::now()).unwrap();
        assert_eq!(sensor.value, 52000);
    }

    #[test]
    fn test_fan_from_label() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);

        let fan = FanSensor::from_label(&Sysfs, &label, Local::now()).unwrap();
        assert_eq!(fan.name, "Left side");
        assert_eq!(fan.readings.min, 2000);
        assert_eq!(fan.readings.max, 6000);
        assert_eq!(fan.readings.manual, 0);
        assert_eq!(fan.paths.safe, label.with_file_name("fan1_safe"));
        assert!(fan.profile().is_none());
    }

    #[test]
    fn test_fan_missing_register_is_an_error() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        fs::remove_file(label.with_file_name("fan1_safe")).unwrap();

        let err = FanSensor::from_label(&Sysfs, &label, Local::now()).unwrap_err();
        assert!(matches!(err, FanProfileError::FileRead { .. }));
    }

    #[test]
    fn test_update_without_profile_only_reads() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();

        fs::write(label.with_file_name("fan1_input"), "2345\n").unwrap();
        fan.update(&io, Local::now(), Some(60)).unwrap();
        assert_eq!(fan.readings.input, 2345);
        assert!(io.writes().is_empty());
    }

    #[test]
    fn test_linear_profile_drives_midpoint() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();
        fan.replace_profile(Some(Profile::derive(&linear(), 2000, 6000).unwrap()));

        fan.update(&io, Local::now(), Some(60)).unwrap();

        assert_eq!(
            io.writes(),
            vec![
                (fan.paths.manual.clone(), 1),
                (fan.paths.output.clone(), 4000),
            ]
        );
        assert_eq!(fan.readings.manual, 1);
        assert_eq!(fan.readings.output, 4000);
        assert_eq!(fs::read_to_string(&fan.paths.output).unwrap(), "4000");
    }

    #[test]
    fn test_unchanged_target_is_not_written() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();
        fan.replace_profile(Some(Profile::derive(&linear(), 2000, 6000).unwrap()));

        fan.update(&io, Local::now(), Some(60)).unwrap();
        assert_eq!(io.writes().len(), 2);

        fan.update(&io, Local::now(), Some(60)).unwrap();
        assert_eq!(io.writes().len(), 2);

        fan.update(&io, Local::now(), Some(80)).unwrap();
        assert_eq!(io.writes().len(), 3);
        assert_eq!(io.writes()[2], (fan.paths.output.clone(), 6000));
    }

    #[test]
    fn test_fixed_speed_profile() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();
        let settings = ProfileSettings {
            manual: true,
            speed: 3500,
            ..ProfileSettings::default()
        };
        fan.replace_profile(Some(Profile::derive(&settings, 2000, 6000).unwrap()));

        fan.update(&io, Local::now(), None).unwrap();
        assert_eq!(fan.readings.output, 3500);

        fan.update(&io, Local::now(), Some(95)).unwrap();
        assert_eq!(fan.readings.output, 3500);
        assert_eq!(io.writes().len(), 2);
    }

    #[test]
    fn test_automatic_profile_resets_manual_flag_only() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        fs::write(label.with_file_name("fan1_manual"), "1\n").unwrap();
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();
        fan.replace_profile(Some(Profile::fixed(false, 0)));

        fan.update(&io, Local::now(), Some(60)).unwrap();
        assert_eq!(io.writes(), vec![(fan.paths.manual.clone(), 0)]);

        fan.update(&io, Local::now(), Some(60)).unwrap();
        assert_eq!(io.writes().len(), 1);
    }

    #[test]
    fn test_missing_reference_aborts_linear_profile() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let io = RecordingIo::default();
        let mut fan = FanSensor::from_label(&io, &label, Local::now()).unwrap();
        fan.replace_profile(Some(Profile::derive(&linear(), 2000, 6000).unwrap()));

        let err = fan.update(&io, Local::now(), None).unwrap_err();
        assert!(matches!(err, FanProfileError::MissingPrimarySensor(_)));
        assert_eq!(io.writes(), vec![(fan.paths.manual.clone(), 1)]);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_readings() {
        let tree = FakeTree::new();
        let label = tree.fan("applesmc", 1, "Left side", 2000, 6000);
        let mut fan = FanSensor::from_label(&Sysfs, &label, Local::now()).unwrap();
        let before = fan.readings;
        let sampled_at = fan.sampled_at;

        fs::write(label.with_file_name("fan1_input"), "3100").unwrap();
        fs::write(label.with_file_name("fan1_safe"), "oops").unwrap();
        assert!(fan.refresh(&Sysfs, Local::now()).is_err());
        assert_eq!(fan.readings, before);
        assert_eq!(fan.sampled_at, sampled_at);
    }
}
