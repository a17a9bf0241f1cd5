//! Deploy Use Case
//!
//! One run, in order:
//! 1. Load the change cache (fresh on clean install)
//! 2. Connect source and destination
//! 3. Clean install, when requested
//! 4. List, diff, and pick a session strategy per side
//! 5. Transfer files on this thread while the database phase runs on a
//!    scoped background thread
//! 6. File mappings, web tenant assets, cache update, permission script
//! 7. Save the cache if anything changed, then disconnect everything

use std::sync::Mutex;
use std::thread;

use chrono::Local;
use tracing::{debug, error, info, warn};

use super::options::DeployOptions;
use super::result::DeployReport;
use crate::application::database::{
    database_files_changed, discover_tenant_databases, main_target, tenant_database_names,
    tenant_target, DatabaseOrchestrator, DatabaseReport,
};
use crate::application::mappings::MappingApplier;
use crate::application::sync::{SessionSource, SessionStrategy, TransferScheduler};
use crate::application::tenants::{load_tenants, TenantProfile};
use crate::application::web_tenants::{WebTenantDeployer, TENANT_OUTPUT_DIRS};
use crate::config::{DatabaseConfig, DeployConfig, TenantsConfig};
use crate::domain::entities::{ChangeCache, FileRecord};
use crate::domain::ports::{
    is_valid_identifier, CacheRepository, Location, LocationError, PasswordHasher, SessionFactory,
    SqlExecutor,
};
use crate::domain::services::Differ;
use crate::domain::value_objects::{DeploymentTarget, IgnorePatterns, RelativePath};
use crate::error::{DatabaseError, StagehandError, StagehandResult};
use crate::infrastructure::ssh::{shell_quote, ConnectionPool, RemoteCommand};

/// Deploy use case - orchestrates one deployment run
///
/// Parameterized by its ports so tests can run it against in-memory
/// locations and a recording SQL executor.
pub struct DeployUseCase<'a, CR: CacheRepository> {
    config: &'a DeployConfig,
    cache_repo: CR,
    source: &'a dyn Location,
    destination: &'a dyn Location,
    source_sessions: Option<&'a dyn SessionFactory>,
    destination_sessions: Option<&'a dyn SessionFactory>,
    database: Option<&'a dyn SqlExecutor>,
    hasher: &'a dyn PasswordHasher,
}

impl<'a, CR: CacheRepository> DeployUseCase<'a, CR> {
    pub fn new(
        config: &'a DeployConfig,
        cache_repo: CR,
        source: &'a dyn Location,
        destination: &'a dyn Location,
        hasher: &'a dyn PasswordHasher,
    ) -> Self {
        Self {
            config,
            cache_repo,
            source,
            destination,
            source_sessions: None,
            destination_sessions: None,
            database: None,
            hasher,
        }
    }

    /// Extra source sessions for pooled transfers.
    pub fn with_source_sessions(mut self, factory: &'a dyn SessionFactory) -> Self {
        self.source_sessions = Some(factory);
        self
    }

    /// Extra destination sessions for pooled transfers.
    pub fn with_destination_sessions(mut self, factory: &'a dyn SessionFactory) -> Self {
        self.destination_sessions = Some(factory);
        self
    }

    pub fn with_database(mut self, executor: &'a dyn SqlExecutor) -> Self {
        self.database = Some(executor);
        self
    }

    /// Run a deployment. Sessions are always disconnected before returning.
    pub fn execute(&self, options: &DeployOptions) -> StagehandResult<DeployReport> {
        let mut cache = if options.clean_install {
            ChangeCache::new()
        } else {
            self.cache_repo.load_or_new(&options.cache_path)?
        };

        let outcome = self.run(options, &mut cache);

        if let Some(executor) = self.database {
            executor.disconnect();
        }
        self.source.disconnect();
        self.destination.disconnect();
        outcome
    }

    fn run(&self, options: &DeployOptions, cache: &mut ChangeCache) -> StagehandResult<DeployReport> {
        let mut report = DeployReport {
            dry_run: options.dry_run,
            ..Default::default()
        };
        connect(self.source)?;
        connect(self.destination)?;

        let profiles = self
            .config
            .tenants
            .as_ref()
            .map(load_tenants)
            .unwrap_or_default();
        let database = self.database_phase(&profiles);

        if options.clean_install {
            self.clean_install(options, database.as_ref())?;
            report.clean_install = !options.dry_run;
        }

        let rules = &self.config.website.ignore;
        let ignore = IgnorePatterns::from_rules(&rules.files, &rules.folders, &rules.extensions)?;
        let tenant_website = self
            .config
            .website
            .tenant_website
            .as_ref()
            .filter(|t| t.enabled);
        let differ = Differ::new(&ignore)
            .with_cache(!options.ignore_cache)
            .with_cache_only(options.cache_only)
            .with_mapped_destinations(
                self.config
                    .website
                    .file_mappings
                    .iter()
                    .map(|m| m.destination.as_str()),
            )
            .with_protected_dirs(if tenant_website.is_some() {
                &TENANT_OUTPUT_DIRS[..]
            } else {
                &[][..]
            });

        let source_files = self.source.list_files(true)?;
        report.cache_only = differ.is_cache_only(cache);
        let destination_files = if report.cache_only {
            info!("using change cache instead of listing the destination");
            Vec::new()
        } else {
            if options.cache_only {
                info!("change cache is empty or disabled; listing destination");
            }
            self.destination.list_files(true)?
        };
        let changes = differ.diff(&source_files, &destination_files, cache);
        info!(
            target: "summary",
            "{} new, {} modified, {} extra file(s)",
            changes.new.len(),
            changes.modified.len(),
            changes.deleted.len()
        );

        let changed = changes.len();
        let source_pool = self.open_pool(self.source, self.source_sessions, changed, options)?;
        let destination_pool =
            match self.open_pool(self.destination, self.destination_sessions, changed, options) {
                Ok(pool) => pool,
                Err(e) => {
                    if let Some(pool) = &source_pool {
                        pool.close_all();
                    }
                    return Err(e);
                }
            };
        let (source_lock, destination_lock) = (Mutex::new(()), Mutex::new(()));
        let source_side = session_source(self.source, source_pool.as_ref(), &source_lock);
        let destination_side =
            session_source(self.destination, destination_pool.as_ref(), &destination_lock);
        report.destination_strategy = Some(destination_side.strategy());
        debug!(
            source = ?source_side.strategy(),
            destination = ?destination_side.strategy(),
            "session strategies chosen"
        );

        let watermark = options.watermark(cache.watermark());
        let (sync, database_outcome) = thread::scope(|scope| {
            let handle = database
                .as_ref()
                .map(|phase| scope.spawn(move || phase.deploy(options, watermark)));

            let sync = TransferScheduler::new(source_side, destination_side)
                .with_concurrency(options.concurrency)
                .with_delete(options.delete_extra_files)
                .with_dry_run(options.dry_run)
                .with_acquire_timeout(options.acquire_timeout)
                .sync(&changes);

            let database_outcome = handle.map(|h| {
                h.join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            });
            (sync, database_outcome)
        });

        for pool in [&source_pool, &destination_pool].into_iter().flatten() {
            let closed = pool.close_all();
            debug!(closed, "connection pool closed");
        }
        report.sync = sync;
        log_sync(&report);

        let mut database_error = None;
        match database_outcome {
            Some(Ok(outcome)) => report.database = outcome,
            Some(Err(e)) => {
                error!("database deployment failed: {}", e);
                database_error = Some(e);
            }
            None => {}
        }

        report.mappings = MappingApplier::new(self.source, self.destination)
            .with_ignore_cache(options.ignore_cache)
            .with_dry_run(options.dry_run)
            .apply(&self.config.website.file_mappings, cache);

        if let Some(tenant_website) = &self.config.website.tenant_website {
            report.web_tenants = WebTenantDeployer::new(tenant_website, self.destination)
                .with_ignore_cache(options.ignore_cache)
                .with_dry_run(options.dry_run)
                .deploy(&profiles, cache);
        }

        if !options.dry_run {
            self.update_cache(cache, &source_files, &ignore, &report);
        }

        if report.files_changed() {
            if let Some(script) = &self.config.website.set_permissions_script {
                report.permissions_ok = self.run_permissions_script(script);
            }
        }

        if report.made_changes() {
            self.cache_repo.save(cache, &options.cache_path)?;
            report.cache_saved = true;
            debug!("change cache saved to {}", options.cache_path.display());
        } else {
            debug!("nothing changed; change cache left untouched");
        }

        match database_error {
            Some(e) => Err(e.into()),
            None => Ok(report),
        }
    }

    fn database_phase<'p>(&'p self, profiles: &'p [TenantProfile]) -> Option<DatabasePhase<'p>> {
        let config = self.config.enabled_database()?;
        let Some(executor) = self.database else {
            warn!("database deployment enabled but no SQL executor configured");
            return None;
        };
        Some(DatabasePhase {
            config,
            executor,
            hasher: self.hasher,
            application_name: self.config.application_name.as_deref(),
            tenants: self.config.tenants.as_ref(),
            profiles,
        })
    }

    fn open_pool(
        &self,
        location: &dyn Location,
        factory: Option<&dyn SessionFactory>,
        changed: usize,
        options: &DeployOptions,
    ) -> StagehandResult<Option<ConnectionPool>> {
        if options.dry_run {
            return Ok(None);
        }
        let strategy = SessionStrategy::choose(
            location.requires_serialization(),
            changed,
            options.concurrency,
            options.pool_threshold,
        );
        match (strategy, factory) {
            (SessionStrategy::Pooled, Some(factory)) => {
                let size = options.concurrency.min(changed);
                info!("opening {} session(s) to {}", size, location.display_name());
                Ok(Some(ConnectionPool::open(factory, size)?))
            }
            (SessionStrategy::Pooled, None) => {
                debug!("no session factory for {}; sharing one session", location.display_name());
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn clean_install(
        &self,
        options: &DeployOptions,
        database: Option<&DatabasePhase<'_>>,
    ) -> StagehandResult<()> {
        if options.dry_run {
            info!("[dry run] would delete every file on {}", self.destination.display_name());
            if database.is_some() {
                info!("[dry run] would drop the main and tenant databases");
            }
            return Ok(());
        }

        warn!("clean install: deleting every file on {}", self.destination.display_name());
        let mut entries = self.destination.list_files(true)?;
        entries.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| b.path.cmp(&a.path)));
        for entry in &entries {
            if entry.is_directory {
                self.destination.delete_directory(&entry.path)?;
            } else {
                self.destination.delete_file(&entry.path)?;
            }
        }
        info!(target: "summary", "clean install removed {} entries", entries.len());

        if let Some(database) = database {
            database.drop_databases()?;
        }
        Ok(())
    }

    fn update_cache(
        &self,
        cache: &mut ChangeCache,
        source_files: &[FileRecord],
        ignore: &IgnorePatterns,
        report: &DeployReport,
    ) {
        let now = Local::now();
        cache.record_sync(
            source_files,
            ignore,
            &report.sync.failed_transfers(),
            now.to_rfc3339(),
        );
        if let Some(database) = &report.database {
            if database.success && database.made_changes() {
                let seconds = now.timestamp_millis() as f64 / 1000.0;
                cache.advance_watermark(seconds, now.to_rfc3339());
            }
        }
    }

    /// `None` when the destination cannot run commands.
    fn run_permissions_script(&self, script: &str) -> Option<bool> {
        let path = match RelativePath::parse(script) {
            Ok(path) => path,
            Err(e) => {
                error!("invalid permissions script path '{}': {}", script, e);
                return Some(false);
            }
        };
        let path = path.as_str();
        let command = RemoteCommand::new("sed")
            .raw("-i")
            .arg("s/\\r$//")
            .arg(path)
            .and(RemoteCommand::new("chmod").raw("+x").arg(path))
            .and(RemoteCommand::new(&shell_quote(&format!("./{}", path))));

        info!("running permissions script {}", path);
        match self.destination.run_command(&command.build()) {
            Ok(output) => {
                debug!("permissions script output: {}", output.trim());
                Some(true)
            }
            Err(LocationError::NotSupported(_)) => {
                debug!("destination cannot run commands; skipping permissions script");
                None
            }
            Err(e) => {
                error!("permissions script failed: {}", e);
                Some(false)
            }
        }
    }
}

fn connect(location: &dyn Location) -> StagehandResult<()> {
    info!("connecting to {}", location.display_name());
    location
        .connect()
        .map_err(|source| StagehandError::Connection {
            target: location.display_name(),
            source,
        })
}

fn session_source<'s>(
    location: &'s dyn Location,
    pool: Option<&'s ConnectionPool>,
    lock: &'s Mutex<()>,
) -> SessionSource<'s> {
    match pool {
        Some(pool) => SessionSource::Pooled(pool),
        None if location.requires_serialization() => SessionSource::Serialized { location, lock },
        None => SessionSource::Direct(location),
    }
}

fn depth(record: &FileRecord) -> usize {
    record.path.matches('/').count()
}

fn log_sync(report: &DeployReport) {
    let sync = &report.sync;
    info!(
        target: "summary",
        "copied {}, updated {}, deleted {}, failed {}",
        sync.copied.succeeded.len(),
        sync.updated.succeeded.len(),
        sync.deleted.succeeded.len(),
        sync.failures().count()
    );
    for failure in sync.failures() {
        error!("{}: {}", failure.path, failure.error);
    }
}

/// Everything the background database thread needs.
struct DatabasePhase<'a> {
    config: &'a DatabaseConfig,
    executor: &'a dyn SqlExecutor,
    hasher: &'a dyn PasswordHasher,
    application_name: Option<&'a str>,
    tenants: Option<&'a TenantsConfig>,
    profiles: &'a [TenantProfile],
}

impl DatabasePhase<'_> {
    fn deploy(
        &self,
        options: &DeployOptions,
        watermark: Option<f64>,
    ) -> Result<Option<DatabaseReport>, DatabaseError> {
        if let Some(mark) = watermark {
            if !database_files_changed(self.config, self.tenants, mark) {
                info!(target: "summary", "database scripts unchanged since last deployment");
                return Ok(None);
            }
        }

        let main = self
            .config
            .main_database_scripts
            .as_ref()
            .map(|m| main_target(self.config, m, self.application_name));
        let tenants = self.tenant_targets(options.dry_run)?;

        let mut orchestrator =
            DatabaseOrchestrator::new(self.executor).with_dry_run(options.dry_run);
        if let Some(seeds) = self.config.enabled_seed_tables() {
            orchestrator = orchestrator.with_seeding(seeds, self.hasher, self.application_name);
        }
        orchestrator.deploy(main.as_ref(), &tenants, watermark).map(Some)
    }

    fn tenant_targets(&self, dry_run: bool) -> Result<Vec<DeploymentTarget>, DatabaseError> {
        let Some(tenant) = self.config.enabled_tenant_database() else {
            return Ok(Vec::new());
        };
        Ok(self
            .tenant_names(dry_run)?
            .iter()
            .map(|name| tenant_target(self.config, tenant, name, self.application_name))
            .collect())
    }

    fn tenant_names(&self, dry_run: bool) -> Result<Vec<String>, DatabaseError> {
        let Some(tenant) = self.config.enabled_tenant_database() else {
            return Ok(Vec::new());
        };
        let Some(query) = &tenant.discover_query else {
            return Ok(tenant_database_names(tenant, self.profiles));
        };

        let main_database = self
            .config
            .main_database_scripts
            .as_ref()
            .map(|m| m.db_name.as_str());
        let discovered = self
            .executor
            .connect()
            .map_err(DatabaseError::Connection)
            .and_then(|()| discover_tenant_databases(self.executor, query, main_database));
        match discovered {
            Err(e) if dry_run => {
                warn!("[dry run] tenant discovery unavailable: {}", e);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Drop the tenant databases, then the main one. Individual failures
    /// are logged; only an unreachable server is an error.
    fn drop_databases(&self) -> Result<(), DatabaseError> {
        self.executor.connect().map_err(DatabaseError::Connection)?;
        let mut names = self.tenant_names(false)?;
        if let Some(main) = &self.config.main_database_scripts {
            names.push(main.db_name.clone());
        }

        for name in names {
            if !is_valid_identifier(&name) {
                warn!("not dropping '{}': not a plain identifier", name);
                continue;
            }
            match self.executor.database_exists(&name) {
                Ok(true) => {
                    let sql = format!("DROP DATABASE IF EXISTS `{}`", name);
                    match self.executor.execute_sql(&sql, None) {
                        Ok(()) => info!("dropped database {}", name),
                        Err(e) => error!("cannot drop database {}: {}", name, e),
                    }
                }
                Ok(false) => debug!("database {} does not exist", name),
                Err(e) => warn!("cannot check database {}: {}", name, e),
            }
        }
        Ok(())
    }
}
