//! Fixtures shared by the unit tests

use crate::errors::Result;
use crate::sysfs::{AttributeIo, Sysfs};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// A throwaway sensor tree laid out like `/sys/devices`
pub struct FakeTree {
    dir: TempDir,
}

impl Default for FakeTree {
    fn default() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn chip_dir(&self, chip: &str) -> PathBuf {
        let dir = self.dir.path().join("platform").join(chip);
        fs::create_dir_all(&dir).expect("create chip dir");
        dir
    }

    /// Create `tempN_label` + `tempN_input` and return the label path
    pub fn temp(&self, chip: &str, index: u32, label: &str, value: i64) -> PathBuf {
        let dir = self.chip_dir(chip);
        let label_path = dir.join(format!("temp{}_label", index));
        fs::write(&label_path, format!("{}\n", label)).expect("write label");
        fs::write(dir.join(format!("temp{}_input", index)), format!("{}\n", value))
            .expect("write input");
        label_path
    }

    /// Create a fan with its six registers and return the label path.
    ///
    /// The fan starts in automatic mode spinning at `min`.
    pub fn fan(&self, chip: &str, index: u32, label: &str, min: i64, max: i64) -> PathBuf {
        let dir = self.chip_dir(chip);
        let label_path = dir.join(format!("fan{}_label", index));
        fs::write(&label_path, format!("{}\n", label)).expect("write label");
        for (field, value) in [
            ("input", min),
            ("manual", 0),
            ("max", max),
            ("min", min),
            ("output", min),
            ("safe", min),
        ] {
            fs::write(
                dir.join(format!("fan{}_{}", index, field)),
                format!("{}\n", value),
            )
            .expect("write register");
        }
        label_path
    }

    pub fn set(&self, path: &Path, value: i64) {
        fs::write(path, format!("{}\n", value)).expect("write value");
    }
}

/// Filesystem access that remembers every register write
#[derive(Default)]
pub struct RecordingIo {
    writes: Mutex<Vec<(PathBuf, i64)>>,
}

impl RecordingIo {
    pub fn writes(&self) -> Vec<(PathBuf, i64)> {
        self.writes.lock().unwrap().clone()
    }
}

impl AttributeIo for RecordingIo {
    fn read_label(&self, path: &Path) -> Result<String> {
        Sysfs.read_label(path)
    }

    fn read_int(&self, path: &Path) -> Result<i64> {
        Sysfs.read_int(path)
    }

    fn write_int(&self, path: &Path, value: i64) -> Result<()> {
        Sysfs.write_int(path, value)?;
        self.writes.lock().unwrap().push((path.to_path_buf(), value));
        Ok(())
    }
}

/// Filesystem access that stalls on reads of one attribute file
pub struct SlowIo {
    file_name: String,
    delay: Duration,
}

impl SlowIo {
    pub fn new(file_name: &str, delay: Duration) -> Self {
        Self {
            file_name: file_name.to_string(),
            delay,
        }
    }
}

impl AttributeIo for SlowIo {
    fn read_label(&self, path: &Path) -> Result<String> {
        Sysfs.read_label(path)
    }

    fn read_int(&self, path: &Path) -> Result<i64> {
        if path.file_name().and_then(|n| n.to_str()) == Some(self.file_name.as_str()) {
            thread::sleep(self.delay);
        }
        Sysfs.read_int(path)
    }

    fn write_int(&self, path: &Path, value: i64) -> Result<()> {
        Sysfs.write_int(path, value)
    }
}
