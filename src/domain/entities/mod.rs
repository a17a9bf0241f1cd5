//! Domain Entities
//!
//! - `FileRecord` - One entry of a location listing
//! - `ChangeSet` - Files to copy, update and delete
//! - `ChangeCache` - What previous runs deployed

mod change_cache;
mod change_set;
mod file_record;

pub use change_cache::{
    ChangeCache, CronjobState, DatabaseWatermark, FileFingerprint, PreBuildState,
    TenantAssetState, CACHE_VERSION,
};
pub use change_set::ChangeSet;
pub use file_record::FileRecord;
