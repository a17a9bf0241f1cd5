//! Deploy Options
//!
//! Run settings resolved from the `options` config section and the command
//! line.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::sync::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_CONCURRENCY, DEFAULT_POOL_THRESHOLD};
use crate::config::OptionsConfig;

/// Options for the deploy use case
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Change cache document
    pub cache_path: PathBuf,
    /// Log what would happen; write nothing
    pub dry_run: bool,
    /// Treat every file and script as changed
    pub ignore_cache: bool,
    /// Wipe the destination and drop databases first
    pub clean_install: bool,
    /// Diff against the cache instead of listing the destination
    pub cache_only: bool,
    pub delete_extra_files: bool,
    pub concurrency: usize,
    pub pool_threshold: usize,
    pub acquire_timeout: Duration,
}

impl DeployOptions {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            dry_run: false,
            ignore_cache: false,
            clean_install: false,
            cache_only: false,
            delete_extra_files: true,
            concurrency: DEFAULT_CONCURRENCY,
            pool_threshold: DEFAULT_POOL_THRESHOLD,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn from_config(options: &OptionsConfig, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            dry_run: options.dry_run,
            ignore_cache: options.ignore_cache,
            clean_install: options.clean_install,
            cache_only: options.cache_only,
            delete_extra_files: options.delete_extra_files,
            concurrency: options.max_concurrent_transfers.max(1),
            pool_threshold: options.pool_threshold,
            acquire_timeout: Duration::from_secs(options.acquire_timeout_secs),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = ignore_cache;
        self
    }

    pub fn with_clean_install(mut self, clean_install: bool) -> Self {
        self.clean_install = clean_install;
        self
    }

    pub fn with_cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }

    pub fn with_delete_extra_files(mut self, delete: bool) -> Self {
        self.delete_extra_files = delete;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_pool_threshold(mut self, threshold: usize) -> Self {
        self.pool_threshold = threshold;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Watermark handed to the database orchestrator.
    pub(crate) fn watermark(&self, cached: Option<f64>) -> Option<f64> {
        if self.ignore_cache || self.clean_install {
            None
        } else {
            cached
        }
    }
}
