//! One-time sensor discovery
//!
//! Walks the device tree looking for `temp*_label` and `fan*_label` files and
//! builds the registry from them. Any sensor that cannot be read aborts
//! discovery, so the daemon never starts on a partial registry.

use crate::errors::{FanProfileError, Result};
use crate::registry::Registry;
use crate::sensors::{FanSensor, TemperatureSensor};
use crate::sysfs::{is_label_file, AttributeIo, LABEL_SUFFIX};
use chrono::Local;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

const TEMPERATURE_PREFIX: &str = "temp";
const FAN_PREFIX: &str = "fan";

/// Scan `root` and return a registry holding every sensor found
pub fn discover(io: &dyn AttributeIo, root: &Path) -> Result<Registry> {
    if !root.is_dir() {
        return Err(FanProfileError::DiscoveryRootMissing(root.to_path_buf()));
    }

    let mut labels = Vec::new();
    collect_labels(root, &mut labels);

    let registry = Registry::new();
    let now = Local::now();
    for path in labels {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if is_label_file(file_name, TEMPERATURE_PREFIX) {
            let sensor = TemperatureSensor::from_label(io, &path, now)?;
            debug!("Found temp sensor '{}' at {}", sensor.name, path.display());
            registry.insert_temperature(sensor)?;
        } else if is_label_file(file_name, FAN_PREFIX) {
            let sensor = FanSensor::from_label(io, &path, now)?;
            debug!("Found fan sensor '{}' at {}", sensor.name, path.display());
            registry.insert_fan(sensor)?;
        }
    }

    info!("collect {} temp sensors", registry.temperature_count());
    info!("collect {} fan sensors", registry.fan_count());
    Ok(registry)
}

/// Depth-first walk in lexical order. Symlinked directories are not followed
/// and unreadable directories are skipped.
fn collect_labels(dir: &Path, labels: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Skipping {}: {}", dir.display(), e);
            return;
        }
    };

    let mut entries: Vec<_> = entries.flatten().collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            collect_labels(&path, labels);
        } else if entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.ends_with(LABEL_SUFFIX))
        {
            labels.push(path);
        }
    }
}
