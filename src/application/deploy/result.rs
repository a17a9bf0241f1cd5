//! Deploy Result
//!
//! What one run did, per component.

use crate::application::database::DatabaseReport;
use crate::application::mappings::MappingReport;
use crate::application::sync::{SessionStrategy, SyncReport};
use crate::application::web_tenants::WebTenantReport;

/// Result of a deploy run
#[derive(Debug, Clone, Default)]
pub struct DeployReport {
    pub sync: SyncReport,
    /// `None` when the database phase was disabled or skipped
    pub database: Option<DatabaseReport>,
    pub mappings: MappingReport,
    pub web_tenants: WebTenantReport,
    /// How transfer workers reached the destination
    pub destination_strategy: Option<SessionStrategy>,
    /// Destination listing replaced by the cache
    pub cache_only: bool,
    pub clean_install: bool,
    /// `Some(false)` when the permission script ran and failed
    pub permissions_ok: Option<bool>,
    pub cache_saved: bool,
    pub dry_run: bool,
}

impl DeployReport {
    pub fn files_changed(&self) -> bool {
        self.sync.made_changes() || self.mappings.made_changes() || self.web_tenants.made_changes()
    }

    /// Whether anything was changed on the destination or in a database.
    pub fn made_changes(&self) -> bool {
        if self.dry_run {
            return false;
        }
        self.clean_install
            || self.files_changed()
            || self.database.as_ref().is_some_and(|db| db.made_changes())
    }

    pub fn is_success(&self) -> bool {
        self.sync.is_success()
            && self.mappings.is_success()
            && self.web_tenants.is_success()
            && self.database.as_ref().map_or(true, |db| db.success)
            && self.permissions_ok != Some(false)
    }
}
