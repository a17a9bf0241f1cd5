//! Tenant profiles
//!
//! Each tenant is described by one JSON file in `tenants.config_files_path`
//! carrying at least a `webid`. The same profiles drive tenant database names,
//! tenant seed data selection and web tenant asset deployment.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::TenantsConfig;
use crate::infrastructure::fs::list_dir_files;

#[derive(Debug, Clone, PartialEq)]
pub struct TenantProfile {
    pub webid: String,
    /// Display name; falls back to the webid
    pub name: String,
    pub config_file: PathBuf,
    pub config_mtime: f64,
}

#[derive(Debug, Deserialize)]
struct TenantDocument {
    #[serde(default)]
    webid: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Load every tenant profile, sorted by file name.
///
/// Unreadable or malformed files and files without a `webid` are skipped
/// with a warning.
pub fn load_tenants(config: &TenantsConfig) -> Vec<TenantProfile> {
    let dir = &config.config_files_path;
    let files = match list_dir_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("cannot read tenant configs in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut tenants = Vec::new();
    for file in files
        .into_iter()
        .filter(|f| f.relative.ends_with(&config.config_files_extension))
    {
        let document: TenantDocument = match fs::read_to_string(&file.absolute)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(document) => document,
            Err(e) => {
                warn!("failed to load tenant config {}: {}", file.absolute.display(), e);
                continue;
            }
        };

        let Some(webid) = document.webid.filter(|w| !w.trim().is_empty()) else {
            warn!(
                "tenant config missing 'webid' field: {}",
                file.absolute.display()
            );
            continue;
        };
        let name = document.name.unwrap_or_else(|| webid.clone());
        tenants.push(TenantProfile {
            webid,
            name,
            config_file: file.absolute,
            config_mtime: file.modified,
        });
    }
    debug!(count = tenants.len(), "tenant profiles loaded");
    tenants
}

/// Expand `{{WEBID}}` in a per-tenant template.
pub fn render_for_tenant(template: &str, webid: &str) -> String {
    template.replace("{{WEBID}}", webid)
}
