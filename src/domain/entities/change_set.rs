//! The result of diffing a source listing against a destination.

use super::FileRecord;

/// Files to copy, update and delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub new: Vec<FileRecord>,
    pub modified: Vec<FileRecord>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Total number of items the scheduler has to process.
    pub fn len(&self) -> usize {
        self.new.len() + self.modified.len() + self.deleted.len()
    }

    pub fn new_paths(&self) -> Vec<&str> {
        self.new.iter().map(|r| r.path.as_str()).collect()
    }

    pub fn modified_paths(&self) -> Vec<&str> {
        self.modified.iter().map(|r| r.path.as_str()).collect()
    }
}
