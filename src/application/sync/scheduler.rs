//! Transfer Scheduler
//!
//! Applies a ChangeSet in three strictly sequential phases: copy new files,
//! update modified files, delete extra files. Each phase is a batch of
//! independent items fanned out to scoped worker threads over a job queue.

use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use tracing::{debug, info, warn};

use super::report::{PhaseReport, SyncReport, TransferError, TransferFailure};
use super::session::SessionSource;
use crate::domain::entities::ChangeSet;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Copy,
    Update,
    Delete,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Copy => "copy",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

pub struct TransferScheduler<'a> {
    source: SessionSource<'a>,
    destination: SessionSource<'a>,
    concurrency: usize,
    delete: bool,
    dry_run: bool,
    acquire_timeout: Duration,
}

impl<'a> TransferScheduler<'a> {
    pub fn new(source: SessionSource<'a>, destination: SessionSource<'a>) -> Self {
        Self {
            source,
            destination,
            concurrency: DEFAULT_CONCURRENCY,
            delete: true,
            dry_run: false,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_delete(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn sync(&self, changes: &ChangeSet) -> SyncReport {
        let mut report = SyncReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        report.copied = self.run_phase(Phase::Copy, owned(changes.new_paths()));
        report.updated = self.run_phase(Phase::Update, owned(changes.modified_paths()));

        if self.delete {
            report.deleted = self.run_phase(Phase::Delete, changes.deleted.clone());
        } else if !changes.deleted.is_empty() {
            info!(
                count = changes.deleted.len(),
                "deletion disabled; leaving extra destination files"
            );
            report.deletions_skipped = changes.deleted.clone();
        }

        report
    }

    fn run_phase(&self, phase: Phase, paths: Vec<String>) -> PhaseReport {
        let mut report = PhaseReport::default();
        if paths.is_empty() {
            return report;
        }

        if self.dry_run {
            for path in &paths {
                info!("[dry run] would {} {}", phase.label(), path);
            }
            report.succeeded = paths;
            report.sort();
            return report;
        }

        let workers = self.concurrency.min(paths.len());
        debug!(phase = phase.label(), items = paths.len(), workers, "starting phase");

        let (job_tx, job_rx) = unbounded::<String>();
        let (result_tx, result_rx) = unbounded::<(String, Result<(), TransferError>)>();
        for path in paths {
            // Receiver is alive until the scope below ends.
            let _ = job_tx.send(path);
        }
        drop(job_tx);

        thread::scope(|scope| {
            for _ in 0..workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for path in jobs.iter() {
                        let outcome = self.transfer(phase, &path);
                        let _ = results.send((path, outcome));
                    }
                });
            }
        });
        drop(result_tx);

        for (path, outcome) in result_rx.iter() {
            match outcome {
                Ok(()) => {
                    debug!("{} {}", phase.label(), path);
                    report.succeeded.push(path);
                }
                Err(error) => {
                    warn!("failed to {} {}: {}", phase.label(), path, error);
                    report.failed.push(TransferFailure { path, error });
                }
            }
        }
        report.sort();
        report
    }

    fn transfer(&self, phase: Phase, path: &str) -> Result<(), TransferError> {
        match phase {
            Phase::Copy | Phase::Update => {
                let content = {
                    let source = self.source.lease(self.acquire_timeout)?;
                    source.read_file(path)?
                };
                let destination = self.destination.lease(self.acquire_timeout)?;
                destination.write_file(path, &content)?;
            }
            Phase::Delete => {
                let destination = self.destination.lease(self.acquire_timeout)?;
                destination.delete_file(path)?;
            }
        }
        Ok(())
    }
}

fn owned(paths: Vec<&str>) -> Vec<String> {
    paths.into_iter().map(str::to_string).collect()
}
