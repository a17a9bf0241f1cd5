//! `stagehand <config>` - one deployment run.

use anyhow::{Context, Result};
use tracing::{info, warn};

use stagehand::config::load_config;
use stagehand::infrastructure::{build_location, BcryptHasher, JsonCacheRepository, RemoteMysql};
use stagehand::{DeployOptions, DeployReport, DeployUseCase};

use super::confirm::confirm_deployment;
use crate::cli::Cli;
use crate::logging;

/// Run the deployment. `Ok(false)` means it finished with failures.
pub fn cmd_deploy(cli: &Cli) -> Result<bool> {
    let loaded = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    logging::init(cli.verbose, loaded.config.options.verbose);
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    let config = &loaded.config;

    let mut options = DeployOptions::from_config(&config.options, loaded.cache_path());
    if cli.dry_run {
        options = options.with_dry_run(true);
    }
    if cli.ignore_cache {
        options = options.with_ignore_cache(true);
    }
    if cli.clean_install {
        options = options.with_clean_install(true);
    }
    if cli.cache_only {
        options = options.with_cache_only(true);
    }
    if let Some(concurrency) = cli.concurrency {
        options = options.with_concurrency(concurrency);
    }

    if config.warn.enabled && !cli.yes {
        confirm_deployment(config.description.as_deref())?;
    }

    let cache_repo = JsonCacheRepository::new();
    let _lock = cache_repo.lock(&options.cache_path)?;

    let source = build_location(&config.source, config.source.path(), "source.path")?;
    let destination = build_location(
        &config.destination,
        config.destination_root(),
        "destination.path",
    )?;
    let database = config.enabled_database().map(RemoteMysql::from_config);
    let hasher = BcryptHasher;

    let mut use_case = DeployUseCase::new(
        config,
        cache_repo,
        source.location.as_ref(),
        destination.location.as_ref(),
        &hasher,
    );
    if let Some(sessions) = &source.sessions {
        use_case = use_case.with_source_sessions(sessions.as_ref());
    }
    if let Some(sessions) = &destination.sessions {
        use_case = use_case.with_destination_sessions(sessions.as_ref());
    }
    if let Some(database) = &database {
        use_case = use_case.with_database(database);
    }

    if options.dry_run {
        info!("dry run: nothing will be changed");
    }
    let report = use_case.execute(&options)?;
    print_summary(&report);
    Ok(report.is_success())
}

fn print_summary(report: &DeployReport) {
    let sync = &report.sync;
    let prefix = if report.dry_run { "[dry run] " } else { "" };
    println!(
        "{}files: {} copied, {} updated, {} deleted, {} failed",
        prefix,
        sync.copied.succeeded.len(),
        sync.updated.succeeded.len(),
        sync.deleted.succeeded.len(),
        sync.failures().count()
    );
    if let Some(database) = &report.database {
        println!(
            "{}database: {} script(s), {} record(s){}",
            prefix,
            database.scripts_executed,
            database.records_inserted,
            if database.success { "" } else { ", with errors" }
        );
    }
    if !report.mappings.written.is_empty() {
        println!("{}mappings: {} written", prefix, report.mappings.written.len());
    }
    if !report.web_tenants.deployed.is_empty() {
        println!("{}web tenants: {}", prefix, report.web_tenants.deployed.join(", "));
    }
    if !report.is_success() {
        println!("deployment finished with errors");
    }
}
