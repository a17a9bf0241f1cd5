//! Differ Domain Service
//!
//! Computes the change set between a source listing and a destination
//! listing, or the change cache standing in for one.

use std::collections::{HashMap, HashSet};

use crate::domain::entities::{ChangeCache, ChangeSet, FileRecord};
use crate::domain::value_objects::{normalize_separators, IgnorePatterns};

/// Size and mtime of the destination side of a comparison.
#[derive(Debug, Clone, Copy)]
struct DestinationEntry {
    size: u64,
    mtime: f64,
}

/// Change detection service.
///
/// - Source-only paths are `new`.
/// - Paths on both sides are skipped when the cached fingerprint matches the
///   source exactly, otherwise `modified` when the size differs or the source
///   is strictly newer.
/// - Destination-only paths are `deleted` unless ignored, produced by a
///   file mapping, or below a protected directory.
#[derive(Debug)]
pub struct Differ<'a> {
    ignore: &'a IgnorePatterns,
    use_cache: bool,
    cache_only: bool,
    mapped_destinations: HashSet<String>,
    protected_dirs: Vec<String>,
}

impl<'a> Differ<'a> {
    pub fn new(ignore: &'a IgnorePatterns) -> Self {
        Self {
            ignore,
            use_cache: true,
            cache_only: false,
            mapped_destinations: HashSet::new(),
            protected_dirs: Vec::new(),
        }
    }

    /// Enable or disable fingerprint skipping (disabled by `ignore_cache`).
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Request cache-only mode (`options.cache_only`). It only takes effect
    /// when the cache is enabled and non-empty.
    pub fn with_cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }

    /// Destination paths written by file mappings; never deleted.
    pub fn with_mapped_destinations<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.mapped_destinations = paths
            .into_iter()
            .map(|p| normalize_separators(p.as_ref()).trim_start_matches('/').to_string())
            .collect();
        self
    }

    /// Destination directories owned by another writer (tenant assets);
    /// nothing below them is deleted.
    pub fn with_protected_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.protected_dirs = dirs
            .into_iter()
            .map(|d| format!("{}/", normalize_separators(d.as_ref()).trim_matches('/')))
            .collect();
        self
    }

    fn is_protected(&self, path: &str) -> bool {
        self.mapped_destinations.contains(path)
            || self.protected_dirs.iter().any(|dir| path.starts_with(dir.as_str()))
    }

    /// True when `diff` will use the cache instead of a destination listing.
    pub fn is_cache_only(&self, cache: &ChangeCache) -> bool {
        self.cache_only && self.use_cache && !cache.is_empty()
    }

    /// Compute the change set.
    ///
    /// In cache-only mode the cached fingerprints act as the destination and
    /// no deletions are reported, since nothing proves the files are gone.
    /// Otherwise `destination` is authoritative, even when it is empty.
    pub fn diff(
        &self,
        source: &[FileRecord],
        destination: &[FileRecord],
        cache: &ChangeCache,
    ) -> ChangeSet {
        let cache_only = self.is_cache_only(cache);

        let index: HashMap<String, DestinationEntry> = if cache_only {
            cache
                .files()
                .map(|(path, fp)| {
                    (
                        path.clone(),
                        DestinationEntry {
                            size: fp.size,
                            mtime: fp.mtime,
                        },
                    )
                })
                .collect()
        } else {
            destination
                .iter()
                .filter(|r| !r.is_directory)
                .map(|r| {
                    (
                        normalize_separators(&r.path),
                        DestinationEntry {
                            size: r.size,
                            mtime: r.modified_time,
                        },
                    )
                })
                .collect()
        };

        let mut changes = ChangeSet::default();
        let mut source_paths = HashSet::new();

        for record in source.iter().filter(|r| !r.is_directory) {
            let path = normalize_separators(&record.path);
            source_paths.insert(path.clone());

            if self.ignore.is_ignored(&path) {
                continue;
            }

            match index.get(&path) {
                None => changes.new.push(FileRecord {
                    path,
                    ..record.clone()
                }),
                Some(dest) => {
                    if self.use_cache
                        && cache
                            .fingerprint(&path)
                            .is_some_and(|fp| fp.matches(record))
                    {
                        continue;
                    }
                    if record.size != dest.size || record.modified_time > dest.mtime {
                        changes.modified.push(FileRecord {
                            path,
                            ..record.clone()
                        });
                    }
                }
            }
        }

        if !cache_only {
            for record in destination.iter().filter(|r| !r.is_directory) {
                let path = normalize_separators(&record.path);
                if source_paths.contains(&path)
                    || self.is_protected(&path)
                    || self.ignore.is_ignored(&path)
                {
                    continue;
                }
                changes.deleted.push(path);
            }
        }

        changes.new.sort_by(|a, b| a.path.cmp(&b.path));
        changes.modified.sort_by(|a, b| a.path.cmp(&b.path));
        changes.deleted.sort();
        changes
    }
}
