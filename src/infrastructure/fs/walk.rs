//! Local filesystem helpers shared by the local backend, the cache
//! repository and the script and asset collectors.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tempfile::NamedTempFile;

/// A regular file found by `walk_files`.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedFile {
    /// Forward-slash path relative to the walk root
    pub relative: String,
    pub absolute: PathBuf,
    pub size: u64,
    pub modified: f64,
}

/// Modification time in epoch seconds (0.0 when unavailable).
pub fn modified_seconds(metadata: &fs::Metadata) -> f64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Modification time of a path in epoch seconds.
pub fn path_mtime(path: &Path) -> io::Result<f64> {
    fs::metadata(path).map(|m| modified_seconds(&m))
}

/// All regular files below `root`, sorted by relative path.
///
/// A `root` that is itself a file yields that single file.
pub fn walk_files(root: &Path) -> io::Result<Vec<WalkedFile>> {
    let metadata = fs::metadata(root)?;
    if metadata.is_file() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![WalkedFile {
            relative: name,
            absolute: root.to_path_buf(),
            size: metadata.len(),
            modified: modified_seconds(&metadata),
        }]);
    }

    let mut files = Vec::new();
    walk_recursive(root, root, true, &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// Files directly inside `dir` (no recursion), sorted by name.
pub fn list_dir_files(dir: &Path) -> io::Result<Vec<WalkedFile>> {
    let mut files = Vec::new();
    walk_recursive(dir, dir, false, &mut files)?;
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

fn walk_recursive(
    root: &Path,
    current: &Path,
    recursive: bool,
    files: &mut Vec<WalkedFile>,
) -> io::Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            if recursive {
                walk_recursive(root, &path, recursive, files)?;
            }
            continue;
        }

        // Follows symlinks to files; dangling links are skipped.
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        files.push(WalkedFile {
            relative,
            absolute: path,
            size: metadata.len(),
            modified: modified_seconds(&metadata),
        });
    }
    Ok(())
}

/// Write through a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
