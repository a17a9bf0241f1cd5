//! Transfer outcomes.

use std::collections::HashSet;

use thiserror::Error;

use crate::domain::ports::LocationError;
use crate::infrastructure::ssh::PoolError;

/// Why one item failed. Never aborts the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("{0}")]
    Location(#[from] LocationError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferFailure {
    pub path: String,
    pub error: TransferError,
}

/// Outcome of one phase (copy, update or delete).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<TransferFailure>,
}

impl PhaseReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn sort(&mut self) {
        self.succeeded.sort();
        self.failed.sort_by(|a, b| a.path.cmp(&b.path));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub copied: PhaseReport,
    pub updated: PhaseReport,
    pub deleted: PhaseReport,
    /// Deletion candidates left alone because deletion is disabled
    pub deletions_skipped: Vec<String>,
    pub dry_run: bool,
}

impl SyncReport {
    /// True when at least one item really changed the destination.
    pub fn made_changes(&self) -> bool {
        !self.dry_run
            && (!self.copied.succeeded.is_empty()
                || !self.updated.succeeded.is_empty()
                || !self.deleted.succeeded.is_empty())
    }

    pub fn is_success(&self) -> bool {
        self.copied.is_success() && self.updated.is_success() && self.deleted.is_success()
    }

    /// Source paths whose copy or update failed.
    pub fn failed_transfers(&self) -> HashSet<String> {
        self.copied
            .failed
            .iter()
            .chain(self.updated.failed.iter())
            .map(|f| f.path.clone())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransferFailure> {
        self.copied
            .failed
            .iter()
            .chain(self.updated.failed.iter())
            .chain(self.deleted.failed.iter())
    }
}
