//! JSON Change Cache Repository
//!
//! Implements the CacheRepository port. The document lives next to the
//! config file as `.deploy_cache_<stem>.json`; a sibling `.lock` file guards
//! it against two runs deploying the same config at once.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::entities::{
    ChangeCache, CronjobState, DatabaseWatermark, FileFingerprint, PreBuildState,
    TenantAssetState, CACHE_VERSION,
};
use crate::domain::ports::{CacheError, CacheRepository, CacheResult};
use crate::infrastructure::fs::atomic_write;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonCache {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    last_deployment: Option<String>,
    #[serde(default)]
    files: BTreeMap<String, JsonFileEntry>,
    #[serde(default)]
    database: JsonDatabase,
    #[serde(default)]
    file_mappings: BTreeMap<String, JsonMtime>,
    #[serde(default)]
    web_tenants: BTreeMap<String, JsonWebTenant>,
    #[serde(default)]
    pre_build: JsonPreBuild,
    #[serde(default)]
    cronjobs: JsonCronjobs,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

fn default_version() -> u32 {
    CACHE_VERSION
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct JsonFileEntry {
    mtime: f64,
    size: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct JsonMtime {
    mtime: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonDatabase {
    #[serde(default)]
    last_deployment_timestamp: Option<f64>,
    #[serde(default)]
    last_deployment: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonWebTenant {
    #[serde(default)]
    config_mtime: Option<f64>,
    #[serde(default)]
    assets: BTreeMap<String, JsonMtime>,
    #[serde(default)]
    css_files: BTreeMap<String, JsonMtime>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonPreBuild {
    #[serde(default)]
    last_build_timestamp: Option<f64>,
    #[serde(default)]
    files: BTreeMap<String, f64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonCronjobs {
    #[serde(default)]
    script_mtime: Option<f64>,
    #[serde(default)]
    create_table_mtime: Option<f64>,
    #[serde(default)]
    insert_data_mtime: Option<f64>,
    #[serde(default)]
    files: BTreeMap<String, f64>,
}

fn mtimes_to_map(entries: BTreeMap<String, JsonMtime>) -> BTreeMap<String, f64> {
    entries.into_iter().map(|(k, v)| (k, v.mtime)).collect()
}

fn map_to_mtimes(entries: &BTreeMap<String, f64>) -> BTreeMap<String, JsonMtime> {
    entries
        .iter()
        .map(|(k, v)| (k.clone(), JsonMtime { mtime: *v }))
        .collect()
}

impl From<JsonCache> for ChangeCache {
    fn from(doc: JsonCache) -> Self {
        let mut cache = ChangeCache::new();
        for (path, entry) in doc.files {
            cache.set_file(
                path,
                FileFingerprint {
                    size: entry.size,
                    mtime: entry.mtime,
                },
            );
        }
        cache.set_last_deployment(doc.last_deployment);
        cache.set_database(DatabaseWatermark {
            timestamp: doc.database.last_deployment_timestamp,
            iso: doc.database.last_deployment,
        });
        for (source, entry) in doc.file_mappings {
            cache.record_mapping(source, entry.mtime);
        }
        for (name, tenant) in doc.web_tenants {
            cache.set_web_tenant(
                name,
                TenantAssetState {
                    config_mtime: tenant.config_mtime,
                    assets: mtimes_to_map(tenant.assets),
                    css_files: mtimes_to_map(tenant.css_files),
                },
            );
        }
        cache.set_pre_build(PreBuildState {
            last_build_timestamp: doc.pre_build.last_build_timestamp,
            files: doc.pre_build.files,
        });
        cache.set_cronjobs(CronjobState {
            script_mtime: doc.cronjobs.script_mtime,
            create_table_mtime: doc.cronjobs.create_table_mtime,
            insert_data_mtime: doc.cronjobs.insert_data_mtime,
            files: doc.cronjobs.files,
        });
        cache.set_unknown_sections(doc.extra);
        cache
    }
}

impl From<&ChangeCache> for JsonCache {
    fn from(cache: &ChangeCache) -> Self {
        let pre_build = cache.pre_build();
        let cronjobs = cache.cronjobs();
        Self {
            version: cache.version(),
            last_deployment: cache.last_deployment().map(str::to_string),
            files: cache
                .files()
                .map(|(path, fp)| {
                    (
                        path.clone(),
                        JsonFileEntry {
                            mtime: fp.mtime,
                            size: fp.size,
                        },
                    )
                })
                .collect(),
            database: JsonDatabase {
                last_deployment_timestamp: cache.database().timestamp,
                last_deployment: cache.database().iso.clone(),
            },
            file_mappings: map_to_mtimes(cache.file_mappings()),
            web_tenants: cache
                .web_tenants()
                .iter()
                .map(|(name, state)| {
                    (
                        name.clone(),
                        JsonWebTenant {
                            config_mtime: state.config_mtime,
                            assets: map_to_mtimes(&state.assets),
                            css_files: map_to_mtimes(&state.css_files),
                        },
                    )
                })
                .collect(),
            pre_build: JsonPreBuild {
                last_build_timestamp: pre_build.last_build_timestamp,
                files: pre_build.files.clone(),
            },
            cronjobs: JsonCronjobs {
                script_mtime: cronjobs.script_mtime,
                create_table_mtime: cronjobs.create_table_mtime,
                insert_data_mtime: cronjobs.insert_data_mtime,
                files: cronjobs.files.clone(),
            },
            extra: cache.unknown_sections().clone(),
        }
    }
}

/// Exclusive hold on a cache document, released on drop.
#[derive(Debug)]
pub struct CacheLock {
    file: fs::File,
    path: PathBuf,
}

impl CacheLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCacheRepository;

impl JsonCacheRepository {
    pub fn new() -> Self {
        Self
    }

    /// Lock file guarding `cache_path`.
    pub fn lock_path(cache_path: &Path) -> PathBuf {
        let mut name = cache_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        cache_path.with_file_name(name)
    }

    /// Take the exclusive run lock without waiting.
    pub fn lock(&self, cache_path: &Path) -> CacheResult<CacheLock> {
        let path = Self::lock_path(cache_path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| CacheError::Locked(cache_path.display().to_string()))?;
        Ok(CacheLock { file, path })
    }

    /// Parse a cache document.
    pub fn parse(&self, content: &str) -> CacheResult<ChangeCache> {
        let doc: JsonCache =
            serde_json::from_str(content).map_err(|e| CacheError::InvalidFormat(e.to_string()))?;
        if doc.version > CACHE_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: doc.version,
                supported: CACHE_VERSION,
            });
        }
        Ok(doc.into())
    }

    /// Render a cache document.
    pub fn render(&self, cache: &ChangeCache) -> CacheResult<String> {
        serde_json::to_string_pretty(&JsonCache::from(cache))
            .map_err(|e| CacheError::InvalidFormat(e.to_string()))
    }
}

impl CacheRepository for JsonCacheRepository {
    fn load_or_new(&self, path: &Path) -> CacheResult<ChangeCache> {
        if !path.exists() {
            debug!(path = %path.display(), "no change cache yet");
            return Ok(ChangeCache::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(ChangeCache::new());
        }
        match self.parse(&content) {
            Err(CacheError::InvalidFormat(reason)) => {
                warn!(
                    path = %path.display(),
                    %reason,
                    "change cache is unreadable; starting from an empty cache"
                );
                Ok(ChangeCache::new())
            }
            other => other,
        }
    }

    fn save(&self, cache: &ChangeCache, path: &Path) -> CacheResult<()> {
        let content = self.render(cache)?;
        atomic_write(path, content.as_bytes())?;
        debug!(path = %path.display(), files = cache.len(), "change cache saved");
        Ok(())
    }
}
