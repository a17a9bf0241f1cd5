//! Local Location
//!
//! Direct filesystem access for a local directory or a mounted network
//! share. Plain filesystem calls are safe to issue from many workers at once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::walk::{atomic_write, modified_seconds};
use crate::domain::entities::FileRecord;
use crate::domain::ports::{Location, LocationError, LocationResult};
use crate::domain::value_objects::RelativePath;

#[derive(Debug)]
pub struct LocalLocation {
    root: PathBuf,
    connected: AtomicBool,
}

impl LocalLocation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connected: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_connected(&self) -> LocationResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(LocationError::NotConnected)
        }
    }

    /// Validate a relative path and anchor it at the root.
    fn resolve(&self, path: &str) -> LocationResult<PathBuf> {
        let relative = RelativePath::parse(path)?;
        Ok(self.root.join(relative.as_str()))
    }

    fn collect(
        &self,
        current: &Path,
        recursive: bool,
        records: &mut Vec<FileRecord>,
    ) -> io::Result<()> {
        for entry in fs::read_dir(current)? {
            let entry = entry?;
            let path = entry.path();
            let Ok(metadata) = fs::metadata(&path) else {
                continue;
            };
            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            if metadata.is_dir() {
                records.push(FileRecord::directory(&relative, modified_seconds(&metadata)));
                if recursive && !entry.file_type()?.is_symlink() {
                    self.collect(&path, recursive, records)?;
                }
            } else if metadata.is_file() {
                records.push(FileRecord::file(
                    &relative,
                    metadata.len(),
                    modified_seconds(&metadata),
                ));
            }
        }
        Ok(())
    }
}

impl Location for LocalLocation {
    fn display_name(&self) -> String {
        format!("share {}", self.root.display())
    }

    fn connect(&self) -> LocationResult<()> {
        if !self.root.is_dir() {
            return Err(LocationError::Connection(format!(
                "{} is not an accessible directory",
                self.root.display()
            )));
        }
        self.connected.store(true, Ordering::Release);
        debug!(root = %self.root.display(), "connected to local location");
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn list_files(&self, recursive: bool) -> LocationResult<Vec<FileRecord>> {
        self.ensure_connected()?;
        let mut records = Vec::new();
        self.collect(&self.root, recursive, &mut records)?;
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    fn read_file(&self, path: &str) -> LocationResult<Vec<u8>> {
        self.ensure_connected()?;
        let full = self.resolve(path)?;
        Ok(fs::read(full)?)
    }

    fn write_file(&self, path: &str, content: &[u8]) -> LocationResult<()> {
        self.ensure_connected()?;
        let full = self.resolve(path)?;
        atomic_write(&full, content)?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> LocationResult<()> {
        self.ensure_connected()?;
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn delete_directory(&self, path: &str) -> LocationResult<()> {
        self.ensure_connected()?;
        let full = self.resolve(path)?;
        match fs::remove_dir_all(&full) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn connected(root: &Path) -> LocalLocation {
        let location = LocalLocation::new(root);
        location.connect().unwrap();
        location
    }

    #[test]
    fn connect_requires_existing_directory() {
        let dir = tempdir().unwrap();
        let missing = LocalLocation::new(dir.path().join("missing"));
        assert!(matches!(
            missing.connect(),
            Err(LocationError::Connection(_))
        ));
    }

    #[test]
    fn operations_require_connect() {
        let dir = tempdir().unwrap();
        let location = LocalLocation::new(dir.path());
        assert_eq!(location.list_files(true), Err(LocationError::NotConnected));
    }

    #[test]
    fn write_creates_parents_and_read_round_trips() {
        let dir = tempdir().unwrap();
        let location = connected(dir.path());

        location.write_file("web/css/site.css", b"body{}").unwrap();

        assert_eq!(location.read_file("web/css/site.css").unwrap(), b"body{}");
        assert!(dir.path().join("web/css/site.css").is_file());
    }

    #[test]
    fn list_files_reports_files_and_directories() {
        let dir = tempdir().unwrap();
        let location = connected(dir.path());
        location.write_file("a/b.txt", b"12345").unwrap();
        location.write_file("c.txt", b"1").unwrap();

        let all = location.list_files(true).unwrap();
        let paths: Vec<_> = all.iter().map(|r| (r.path.as_str(), r.is_directory)).collect();
        assert_eq!(paths, vec![("a", true), ("a/b.txt", false), ("c.txt", false)]);
        assert_eq!(all[1].size, 5);

        let top: Vec<_> = location
            .list_files(false)
            .unwrap()
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(top, vec!["a".to_string(), "c.txt".to_string()]);
    }

    #[test]
    fn traversal_is_rejected_before_io() {
        let dir = tempdir().unwrap();
        let location = connected(dir.path());

        assert!(matches!(
            location.read_file("../../etc/passwd"),
            Err(LocationError::InvalidPath(_))
        ));
        assert!(matches!(
            location.write_file("a/../../escape.txt", b"x"),
            Err(LocationError::InvalidPath(_))
        ));
        assert!(!dir.path().parent().unwrap().join("escape.txt").exists());
    }

    #[test]
    fn deletes_are_idempotent() {
        let dir = tempdir().unwrap();
        let location = connected(dir.path());
        location.write_file("old/file.txt", b"x").unwrap();

        location.delete_file("old/file.txt").unwrap();
        location.delete_file("old/file.txt").unwrap();
        location.delete_directory("old").unwrap();
        location.delete_directory("old").unwrap();

        assert!(!dir.path().join("old").exists());
    }

    #[test]
    fn local_location_does_not_serialize() {
        let dir = tempdir().unwrap();
        assert!(!LocalLocation::new(dir.path()).requires_serialization());
    }
}
