//! Change cache entity - what the previous runs deployed
//!
//! The cache lets a run skip files, mappings, tenant assets and SQL scripts
//! that have not changed since they were last deployed. It is a pure data
//! structure; loading and saving go through `CacheRepository`.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use super::FileRecord;
use crate::domain::value_objects::IgnorePatterns;

/// Current cache document version
pub const CACHE_VERSION: u32 = 1;

/// Size and modification time of a deployed file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileFingerprint {
    pub size: u64,
    pub mtime: f64,
}

impl FileFingerprint {
    pub fn of(record: &FileRecord) -> Self {
        Self {
            size: record.size,
            mtime: record.modified_time,
        }
    }

    /// Exact equality; staleness comparisons would misfire on clock skew.
    pub fn matches(&self, record: &FileRecord) -> bool {
        self.size == record.size && self.mtime == record.modified_time
    }
}

/// Timestamp below which SQL scripts count as already applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseWatermark {
    pub timestamp: Option<f64>,
    pub iso: Option<String>,
}

/// Deployed state of one web tenant's config, assets and generated CSS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TenantAssetState {
    pub config_mtime: Option<f64>,
    pub assets: BTreeMap<String, f64>,
    pub css_files: BTreeMap<String, f64>,
}

/// Pre-build step state. Carried so documents round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreBuildState {
    pub last_build_timestamp: Option<f64>,
    pub files: BTreeMap<String, f64>,
}

/// Cron script state. Carried so documents round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CronjobState {
    pub script_mtime: Option<f64>,
    pub create_table_mtime: Option<f64>,
    pub insert_data_mtime: Option<f64>,
    pub files: BTreeMap<String, f64>,
}

/// The persisted change cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeCache {
    version: u32,
    last_deployment: Option<String>,
    files: BTreeMap<String, FileFingerprint>,
    database: DatabaseWatermark,
    file_mappings: BTreeMap<String, f64>,
    web_tenants: BTreeMap<String, TenantAssetState>,
    pre_build: PreBuildState,
    cronjobs: CronjobState,
    unknown_sections: BTreeMap<String, Value>,
}

impl Default for ChangeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION,
            last_deployment: None,
            files: BTreeMap::new(),
            database: DatabaseWatermark::default(),
            file_mappings: BTreeMap::new(),
            web_tenants: BTreeMap::new(),
            pre_build: PreBuildState::default(),
            cronjobs: CronjobState::default(),
            unknown_sections: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// True when no file fingerprints are cached.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    // --- files ---

    pub fn fingerprint(&self, path: &str) -> Option<&FileFingerprint> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&String, &FileFingerprint)> {
        self.files.iter()
    }

    pub fn set_file(&mut self, path: impl Into<String>, fingerprint: FileFingerprint) {
        self.files.insert(path.into(), fingerprint);
    }

    pub fn remove_file(&mut self, path: &str) -> Option<FileFingerprint> {
        self.files.remove(path)
    }

    /// Listing synthesized from the cached fingerprints.
    pub fn as_listing(&self) -> Vec<FileRecord> {
        self.files
            .iter()
            .map(|(path, fp)| FileRecord::file(path, fp.size, fp.mtime))
            .collect()
    }

    /// Replace the file section with the current source listing.
    ///
    /// Paths in `failed` keep their previous fingerprint (or stay absent) so
    /// the next run picks them up again.
    pub fn record_sync(
        &mut self,
        source: &[FileRecord],
        ignore: &IgnorePatterns,
        failed: &HashSet<String>,
        timestamp_iso: impl Into<String>,
    ) {
        let mut files = BTreeMap::new();
        for record in source {
            if record.is_directory || ignore.is_ignored(&record.path) {
                continue;
            }
            if failed.contains(&record.path) {
                if let Some(previous) = self.files.get(&record.path) {
                    files.insert(record.path.clone(), *previous);
                }
                continue;
            }
            files.insert(record.path.clone(), FileFingerprint::of(record));
        }
        self.files = files;
        self.last_deployment = Some(timestamp_iso.into());
    }

    pub fn last_deployment(&self) -> Option<&str> {
        self.last_deployment.as_deref()
    }

    pub fn set_last_deployment(&mut self, iso: Option<String>) {
        self.last_deployment = iso;
    }

    // --- database ---

    pub fn watermark(&self) -> Option<f64> {
        self.database.timestamp
    }

    pub fn database(&self) -> &DatabaseWatermark {
        &self.database
    }

    pub fn advance_watermark(&mut self, timestamp: f64, iso: impl Into<String>) {
        self.database = DatabaseWatermark {
            timestamp: Some(timestamp),
            iso: Some(iso.into()),
        };
    }

    pub fn set_database(&mut self, database: DatabaseWatermark) {
        self.database = database;
    }

    // --- file mappings ---

    pub fn mapping_mtime(&self, source: &str) -> Option<f64> {
        self.file_mappings.get(source).copied()
    }

    pub fn record_mapping(&mut self, source: impl Into<String>, mtime: f64) {
        self.file_mappings.insert(source.into(), mtime);
    }

    pub fn file_mappings(&self) -> &BTreeMap<String, f64> {
        &self.file_mappings
    }

    // --- web tenants ---

    pub fn web_tenant(&self, name: &str) -> Option<&TenantAssetState> {
        self.web_tenants.get(name)
    }

    pub fn web_tenants(&self) -> &BTreeMap<String, TenantAssetState> {
        &self.web_tenants
    }

    pub fn set_web_tenant(&mut self, name: impl Into<String>, state: TenantAssetState) {
        self.web_tenants.insert(name.into(), state);
    }

    // --- carried sections ---

    pub fn pre_build(&self) -> &PreBuildState {
        &self.pre_build
    }

    pub fn set_pre_build(&mut self, state: PreBuildState) {
        self.pre_build = state;
    }

    pub fn cronjobs(&self) -> &CronjobState {
        &self.cronjobs
    }

    pub fn set_cronjobs(&mut self, state: CronjobState) {
        self.cronjobs = state;
    }

    /// Top-level keys this version does not understand, kept for the next save.
    pub fn unknown_sections(&self) -> &BTreeMap<String, Value> {
        &self.unknown_sections
    }

    pub fn set_unknown_sections(&mut self, sections: BTreeMap<String, Value>) {
        self.unknown_sections = sections;
    }
}
