//! File mappings
//!
//! Copies individual files to a destination path outside the normal
//! one-to-one tree sync, e.g. `config/prod.env -> .env`.

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use super::sync::{TransferError, TransferFailure};
use crate::config::FileMapping;
use crate::domain::entities::ChangeCache;
use crate::domain::ports::{Location, LocationError};
use crate::infrastructure::fs::path_mtime;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingReport {
    /// Destination paths written
    pub written: Vec<String>,
    /// Absolute sources unchanged since the last run
    pub skipped: Vec<String>,
    pub failed: Vec<TransferFailure>,
}

impl MappingReport {
    pub fn made_changes(&self) -> bool {
        !self.written.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct MappingApplier<'a> {
    source: &'a dyn Location,
    destination: &'a dyn Location,
    ignore_cache: bool,
    dry_run: bool,
}

impl<'a> MappingApplier<'a> {
    pub fn new(source: &'a dyn Location, destination: &'a dyn Location) -> Self {
        Self {
            source,
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

    /// Apply every mapping. Absolute sources are local files tracked in the
    /// cache by mtime; relative sources come from the source location and
    /// are copied every run.
    pub fn apply(&self, mappings: &[FileMapping], cache: &mut ChangeCache) -> MappingReport {
        let mut report = MappingReport::default();
        for mapping in mappings {
            let local = Path::new(&mapping.source);
            let result = if local.is_absolute() {
                self.apply_local(mapping, local, cache, &mut report)
            } else {
                self.apply_relative(mapping, &mut report)
            };
            if let Err(error) = result {
                error!(
                    "file mapping {} -> {} failed: {}",
                    mapping.source, mapping.destination, error
                );
                report.failed.push(TransferFailure {
                    path: mapping.destination.clone(),
                    error: TransferError::Location(error),
                });
            }
        }
        report
    }

    fn apply_local(
        &self,
        mapping: &FileMapping,
        local: &Path,
        cache: &mut ChangeCache,
        report: &mut MappingReport,
    ) -> Result<(), LocationError> {
        let mtime = path_mtime(local)?;
        if !self.ignore_cache && cache.mapping_mtime(&mapping.source) == Some(mtime) {
            debug!("mapping source unchanged: {}", mapping.source);
            report.skipped.push(mapping.source.clone());
            return Ok(());
        }
        if self.dry_run {
            info!("[dry run] would copy {} -> {}", mapping.source, mapping.destination);
            return Ok(());
        }

        let content = fs::read(local)?;
        self.destination.write_file(&mapping.destination, &content)?;
        cache.record_mapping(mapping.source.clone(), mtime);
        info!("mapped {} -> {}", mapping.source, mapping.destination);
        report.written.push(mapping.destination.clone());
        Ok(())
    }

    fn apply_relative(
        &self,
        mapping: &FileMapping,
        report: &mut MappingReport,
    ) -> Result<(), LocationError> {
        if self.dry_run {
            info!("[dry run] would copy {} -> {}", mapping.source, mapping.destination);
            return Ok(());
        }
        let content = self.source.read_file(&mapping.source)?;
        self.destination.write_file(&mapping.destination, &content)?;
        info!("mapped {} -> {}", mapping.source, mapping.destination);
        report.written.push(mapping.destination.clone());
        Ok(())
    }
}
