//! Web tenant assets
//!
//! Each tenant gets its config file, its asset directory and its
//! pre-generated CSS deployed under `web/`. A tenant is redeployed when any
//! of those files is newer than what the cache recorded.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use super::sync::{TransferError, TransferFailure};
use super::tenants::{render_for_tenant, TenantProfile};
use crate::config::TenantWebsiteConfig;
use crate::domain::entities::{ChangeCache, TenantAssetState};
use crate::domain::ports::{Location, LocationError};
use crate::infrastructure::fs::{walk_files, WalkedFile};

const CONFIG_DIR: &str = "web/tenants/_config";
const ASSETS_DIR: &str = "web/tenants";
const CSS_DIR: &str = "web/generated/css";

/// Destination directories written by tenant deployments.
pub const TENANT_OUTPUT_DIRS: [&str; 2] = [ASSETS_DIR, CSS_DIR];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebTenantReport {
    /// Tenants whose files were written
    pub deployed: Vec<String>,
    pub files_written: usize,
    pub failed: Vec<TransferFailure>,
}

impl WebTenantReport {
    pub fn made_changes(&self) -> bool {
        self.files_written > 0
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Local files that make up one tenant's web presence.
struct TenantFiles {
    assets: Vec<WalkedFile>,
    css: Vec<WalkedFile>,
}

impl TenantFiles {
    fn collect(config: &TenantWebsiteConfig, webid: &str) -> Self {
        let assets = config
            .assets_path
            .as_deref()
            .map(|template| PathBuf::from(render_for_tenant(template, webid)))
            .map(|dir| existing_files(&dir))
            .unwrap_or_default();
        let css = config
            .generated_css_path
            .as_deref()
            .map(|dir| existing_files(&dir.join(webid)))
            .unwrap_or_default()
            .into_iter()
            .filter(|f| f.relative.ends_with(".css"))
            .collect();
        Self { assets, css }
    }

    fn state(&self, config_mtime: f64) -> TenantAssetState {
        let mtimes = |files: &[WalkedFile]| -> BTreeMap<String, f64> {
            files
                .iter()
                .map(|f| (f.absolute.display().to_string(), f.modified))
                .collect()
        };
        TenantAssetState {
            config_mtime: Some(config_mtime),
            assets: mtimes(&self.assets),
            css_files: mtimes(&self.css),
        }
    }
}

fn existing_files(dir: &Path) -> Vec<WalkedFile> {
    if !dir.is_dir() {
        return Vec::new();
    }
    walk_files(dir).unwrap_or_else(|e| {
        error!("cannot read {}: {}", dir.display(), e);
        Vec::new()
    })
}

/// True when `current` holds anything newer than `cached`. Entries missing
/// from the cache count as newer.
fn is_stale(current: &TenantAssetState, cached: Option<&TenantAssetState>) -> bool {
    let Some(cached) = cached else {
        return true;
    };
    let newer = |now: &BTreeMap<String, f64>, then: &BTreeMap<String, f64>| {
        now.iter()
            .any(|(path, mtime)| *mtime > then.get(path).copied().unwrap_or(0.0))
    };
    current.config_mtime.unwrap_or(0.0) > cached.config_mtime.unwrap_or(0.0)
        || newer(&current.assets, &cached.assets)
        || newer(&current.css_files, &cached.css_files)
}

pub struct WebTenantDeployer<'a> {
    config: &'a TenantWebsiteConfig,
    destination: &'a dyn Location,
    ignore_cache: bool,
    dry_run: bool,
}

impl<'a> WebTenantDeployer<'a> {
    pub fn new(config: &'a TenantWebsiteConfig, destination: &'a dyn Location) -> Self {
        Self {
            config,
            destination,
            ignore_cache: false,
            dry_run: false,
        }
    }

    pub fn with_ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = ignore_cache;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn deploy(&self, tenants: &[TenantProfile], cache: &mut ChangeCache) -> WebTenantReport {
        let mut report = WebTenantReport::default();
        if !self.config.enabled {
            return report;
        }

        for tenant in tenants {
            let files = TenantFiles::collect(self.config, &tenant.webid);
            let state = files.state(tenant.config_mtime);
            if !self.ignore_cache && !is_stale(&state, cache.web_tenant(&tenant.webid)) {
                debug!("web tenant {} unchanged", tenant.webid);
                continue;
            }

            info!(
                "deploying web tenant {} ({} asset(s), {} css file(s))",
                tenant.name,
                files.assets.len(),
                files.css.len()
            );
            if self.dry_run {
                continue;
            }

            let before = report.failed.len();
            self.deploy_tenant(tenant, &files, &mut report);
            if report.failed.len() == before {
                cache.set_web_tenant(tenant.webid.clone(), state);
                report.deployed.push(tenant.webid.clone());
            }
        }
        report
    }

    fn deploy_tenant(&self, tenant: &TenantProfile, files: &TenantFiles, report: &mut WebTenantReport) {
        let config_name = tenant
            .config_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.json", tenant.webid));
        self.upload(
            &tenant.config_file,
            &format!("{}/{}", CONFIG_DIR, config_name),
            report,
        );
        for asset in &files.assets {
            let target = format!("{}/{}/{}", ASSETS_DIR, tenant.webid, asset.relative);
            self.upload(&asset.absolute, &target, report);
        }
        for css in &files.css {
            let target = format!("{}/{}/{}", CSS_DIR, tenant.webid, css.relative);
            self.upload(&css.absolute, &target, report);
        }
    }

    fn upload(&self, local: &Path, target: &str, report: &mut WebTenantReport) {
        let result = fs::read(local)
            .map_err(LocationError::from)
            .and_then(|content| self.destination.write_file(target, &content));
        match result {
            Ok(()) => {
                debug!("uploaded {}", target);
                report.files_written += 1;
            }
            Err(e) => {
                error!("failed to upload {}: {}", target, e);
                report.failed.push(TransferFailure {
                    path: target.to_string(),
                    error: TransferError::Location(e),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    use tempfile::{tempdir, TempDir};

    use crate::infrastructure::fs::LocalLocation;

    struct Fixture {
        local: TempDir,
        remote: TempDir,
        destination: LocalLocation,
        config: TenantWebsiteConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let local = tempdir().unwrap();
            let remote = tempdir().unwrap();
            for rel in [
                "tenants/acme.json",
                "assets/acme/logo.png",
                "assets/acme/img/hero.jpg",
                "css/acme/theme.css",
                "css/acme/theme.css.map",
            ] {
                let path = local.path().join(rel);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, rel).unwrap();
            }
            let destination = LocalLocation::new(remote.path());
            destination.connect().unwrap();
            let config = TenantWebsiteConfig {
                enabled: true,
                assets_path: Some(format!("{}/assets/{{{{WEBID}}}}", local.path().display())),
                generated_css_path: Some(local.path().join("css")),
            };
            Self {
                local,
                remote,
                destination,
                config,
            }
        }

        fn tenant(&self) -> TenantProfile {
            let config_file = self.local.path().join("tenants/acme.json");
            TenantProfile {
                webid: "acme".to_string(),
                name: "Acme".to_string(),
                config_mtime: crate::infrastructure::fs::path_mtime(&config_file).unwrap(),
                config_file,
            }
        }

        fn deployer(&self) -> WebTenantDeployer<'_> {
            WebTenantDeployer::new(&self.config, &self.destination)
        }
    }

    #[test]
    fn first_run_deploys_config_assets_and_css() {
        let fx = Fixture::new();
        let mut cache = ChangeCache::new();

        let report = fx.deployer().deploy(&[fx.tenant()], &mut cache);

        assert_eq!(report.deployed, vec!["acme"]);
        assert_eq!(report.files_written, 4);
        for rel in [
            "web/tenants/_config/acme.json",
            "web/tenants/acme/logo.png",
            "web/tenants/acme/img/hero.jpg",
            "web/generated/css/acme/theme.css",
        ] {
            assert!(fx.remote.path().join(rel).exists(), "{} missing", rel);
        }
        assert!(!fx.remote.path().join("web/generated/css/acme/theme.css.map").exists());
        let state = cache.web_tenant("acme").unwrap();
        assert_eq!(state.assets.len(), 2);
        assert_eq!(state.css_files.len(), 1);
    }

    #[test]
    fn unchanged_tenant_is_skipped_until_an_asset_changes() {
        let fx = Fixture::new();
        let mut cache = ChangeCache::new();
        fx.deployer().deploy(&[fx.tenant()], &mut cache);

        let second = fx.deployer().deploy(&[fx.tenant()], &mut cache);
        assert!(!second.made_changes());

        let logo = fx.local.path().join("assets/acme/logo.png");
        let file = fs::File::options().write(true).open(&logo).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(4_000_000_000))
            .unwrap();
        let third = fx.deployer().deploy(&[fx.tenant()], &mut cache);
        assert_eq!(third.files_written, 4);
    }

    #[test]
    fn ignore_cache_forces_deploy() {
        let fx = Fixture::new();
        let mut cache = ChangeCache::new();
        fx.deployer().deploy(&[fx.tenant()], &mut cache);

        let forced = fx
            .deployer()
            .with_ignore_cache(true)
            .deploy(&[fx.tenant()], &mut cache);
        assert!(forced.made_changes());
    }

    #[test]
    fn dry_run_leaves_destination_and_cache_alone() {
        let fx = Fixture::new();
        let mut cache = ChangeCache::new();

        let report = fx
            .deployer()
            .with_dry_run(true)
            .deploy(&[fx.tenant()], &mut cache);

        assert!(!report.made_changes());
        assert!(cache.web_tenant("acme").is_none());
        assert!(!fx.remote.path().join("web").exists());
    }

    #[test]
    fn staleness_counts_missing_entries_as_newer() {
        let mut current = TenantAssetState {
            config_mtime: Some(10.0),
            ..Default::default()
        };
        current.assets.insert("/a/logo.png".to_string(), 5.0);
        let mut cached = current.clone();
        assert!(!is_stale(&current, Some(&cached)));

        cached.assets.clear();
        assert!(is_stale(&current, Some(&cached)));
        assert!(is_stale(&current, None));
    }
}
