//! Attribute file access for hwmon-style sensor trees
//!
//! Every sensor attribute is a small text file holding either a label or a
//! base-10 integer. Reads tolerate surrounding newlines; writes replace the
//! whole file with the bare decimal string.

use crate::errors::{FanProfileError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix marking a sensor label file (`temp1_label`, `fan2_label`, ...)
pub const LABEL_SUFFIX: &str = "_label";

/// Reads and writes sensor attribute files.
///
/// The daemon talks to hardware through [`Sysfs`]; tests swap in recording
/// implementations to observe which registers get written.
pub trait AttributeIo: Send + Sync {
    /// Read a label file and return its newline-trimmed content
    fn read_label(&self, path: &Path) -> Result<String>;

    /// Read an integer attribute
    fn read_int(&self, path: &Path) -> Result<i64>;

    /// Replace an integer attribute with `value`
    fn write_int(&self, path: &Path, value: i64) -> Result<()>;
}

/// Direct filesystem access
#[derive(Debug, Clone, Copy, Default)]
pub struct Sysfs;

impl AttributeIo for Sysfs {
    fn read_label(&self, path: &Path) -> Result<String> {
        let content = read_file(path)?;
        Ok(content.trim_matches('\n').to_string())
    }

    fn read_int(&self, path: &Path) -> Result<i64> {
        let content = read_file(path)?;
        parse_int(path, &content)
    }

    fn write_int(&self, path: &Path, value: i64) -> Result<()> {
        fs::write(path, value.to_string()).map_err(|source| FanProfileError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| FanProfileError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse the content of an integer attribute file
pub fn parse_int(path: &Path, content: &str) -> Result<i64> {
    let trimmed = content.trim_matches('\n');
    trimmed.parse().map_err(|_| FanProfileError::Parse {
        path: path.to_path_buf(),
        value: trimmed.to_string(),
    })
}

/// Whether `file_name` is a label file of the sensor family `prefix`
pub fn is_label_file(file_name: &str, prefix: &str) -> bool {
    file_name.starts_with(prefix) && file_name.ends_with(LABEL_SUFFIX)
}

/// Derive the path of a sibling attribute from a label path.
///
/// `/x/fan1_label` with field `output` becomes `/x/fan1_output`.
pub fn sibling_path(label_path: &Path, field: &str) -> Result<PathBuf> {
    let stem = label_path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix("label"))
        .ok_or_else(|| FanProfileError::InvalidLabelPath(label_path.to_path_buf()))?;

    Ok(label_path.with_file_name(format!("{}{}", stem, field)))
}
