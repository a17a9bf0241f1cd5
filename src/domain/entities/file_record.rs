//! File listing entries.

use crate::domain::value_objects::normalize_separators;

/// One entry of a location listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Forward-slash path relative to the location root
    pub path: String,
    pub size: u64,
    /// Seconds since the Unix epoch
    pub modified_time: f64,
    pub is_directory: bool,
}

impl FileRecord {
    pub fn file(path: &str, size: u64, modified_time: f64) -> Self {
        Self {
            path: normalize_separators(path),
            size,
            modified_time,
            is_directory: false,
        }
    }

    pub fn directory(path: &str, modified_time: f64) -> Self {
        Self {
            path: normalize_separators(path),
            size: 0,
            modified_time,
            is_directory: true,
        }
    }
}
