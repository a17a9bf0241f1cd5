//! Database deployment orchestration
//!
//! Targets are deployed one after another, main first. Each target runs its
//! stages in `StageKind` order:
//!
//! 1. Setup, with no database selected. A database that does not exist yet
//!    gets every setup script, whatever the watermark says.
//! 2. For tenants, a `USE` check. A tenant that cannot be entered is skipped.
//! 3. Tables, procedures and data, filtered by the watermark.
//! 4. Seeding, as part of the data stage.

use tracing::{error, info, warn};

use super::scripts::ScriptRunner;
use super::seeding::Seeder;
use crate::config::SeedTablesConfig;
use crate::domain::ports::{is_valid_identifier, PasswordHasher, SqlExecutor};
use crate::domain::value_objects::{DeploymentTarget, StageKind};
use crate::error::DatabaseError;

/// Outcome for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSummary {
    pub database_name: String,
    pub success: bool,
    pub scripts_executed: usize,
    pub records_inserted: usize,
}

/// Outcome of a database deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseReport {
    pub success: bool,
    pub scripts_executed: usize,
    pub records_inserted: usize,
    pub targets: Vec<TargetSummary>,
}

impl DatabaseReport {
    pub fn made_changes(&self) -> bool {
        self.scripts_executed > 0 || self.records_inserted > 0
    }

    fn push(&mut self, summary: TargetSummary) {
        self.success &= summary.success;
        self.scripts_executed += summary.scripts_executed;
        self.records_inserted += summary.records_inserted;
        self.targets.push(summary);
    }
}

struct Seeding<'a> {
    config: &'a SeedTablesConfig,
    hasher: &'a dyn PasswordHasher,
    application_name: Option<&'a str>,
}

pub struct DatabaseOrchestrator<'a> {
    executor: &'a dyn SqlExecutor,
    dry_run: bool,
    seeding: Option<Seeding<'a>>,
}

impl<'a> DatabaseOrchestrator<'a> {
    pub fn new(executor: &'a dyn SqlExecutor) -> Self {
        Self {
            executor,
            dry_run: false,
            seeding: None,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Seed tables during each target's data stage.
    pub fn with_seeding(
        mut self,
        config: &'a SeedTablesConfig,
        hasher: &'a dyn PasswordHasher,
        application_name: Option<&'a str>,
    ) -> Self {
        self.seeding = Some(Seeding {
            config,
            hasher,
            application_name,
        });
        self
    }

    /// Deploy `main` then every tenant. Only an unreachable server is an
    /// error; script failures are reported.
    pub fn deploy(
        &self,
        main: Option<&DeploymentTarget>,
        tenants: &[DeploymentTarget],
        watermark: Option<f64>,
    ) -> Result<DatabaseReport, DatabaseError> {
        if self.dry_run {
            info!("[dry run] skipping database connection test");
        } else {
            self.executor.connect().map_err(DatabaseError::Connection)?;
        }

        let mut report = DatabaseReport {
            success: true,
            ..Default::default()
        };
        for target in main.into_iter().chain(tenants) {
            report.push(self.deploy_target(target, watermark));
        }

        info!(
            target: "summary",
            "database deployment {}: {} script(s) executed, {} record(s) inserted",
            if report.success { "completed" } else { "completed with errors" },
            report.scripts_executed,
            report.records_inserted
        );
        Ok(report)
    }

    fn deploy_target(&self, target: &DeploymentTarget, watermark: Option<f64>) -> TargetSummary {
        let name = target.database_name.as_str();
        let mut summary = TargetSummary {
            database_name: name.to_string(),
            success: true,
            scripts_executed: 0,
            records_inserted: 0,
        };
        if !is_valid_identifier(name) {
            error!("refusing to deploy {}: not a plain identifier", target);
            summary.success = false;
            return summary;
        }
        info!("deploying {}", target);

        let exists = self.database_exists(name);
        let runner = ScriptRunner::new(self.executor).with_dry_run(self.dry_run);

        for kind in StageKind::ALL {
            if let Some(path) = target.stage_path(kind) {
                let since = if kind == StageKind::Setup && !exists {
                    info!("{} does not exist, running every setup script", target);
                    None
                } else {
                    watermark
                };

                if path.exists() {
                    info!("running {} scripts from {}", kind, path.display());
                    let outcome = runner.execute_sql_directory(
                        path,
                        kind.uses_database(),
                        &target.template_vars,
                        Some(name),
                        since,
                    );
                    summary.success &= outcome.success;
                    summary.scripts_executed += outcome.executed;
                } else {
                    warn!("{} path not found: {}", kind, path.display());
                }
            }

            if kind == StageKind::Setup && target.is_tenant() {
                if let Err(e) = runner.execute_sql_command(&format!("USE {}", name), None) {
                    error!("cannot switch to tenant database {}: {}", name, e);
                    summary.success = false;
                    return summary;
                }
            }

            if kind == StageKind::Data {
                if let Some(seeding) = &self.seeding {
                    let seed = Seeder::new(self.executor, seeding.hasher)
                        .with_dry_run(self.dry_run)
                        .seed_from_config(
                            seeding.config,
                            name,
                            target.is_tenant(),
                            seeding.application_name,
                        );
                    summary.success &= seed.success;
                    summary.records_inserted += seed.records_inserted;
                }
            }
        }
        summary
    }

    fn database_exists(&self, name: &str) -> bool {
        if self.dry_run {
            return true;
        }
        match self.executor.database_exists(name) {
            Ok(exists) => exists,
            Err(e) => {
                warn!("cannot check whether database {} exists: {}", name, e);
                false
            }
        }
    }
}
