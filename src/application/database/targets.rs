//! Deployment target construction
//!
//! Turns the database section of the config into one main target and one
//! target per tenant, each carrying its stage paths and template variables.

use std::path::Path;

use tracing::{debug, warn};

use crate::application::tenants::{render_for_tenant, TenantProfile};
use crate::config::{
    DatabaseConfig, MainDatabaseConfig, ScriptPaths, TenantDatabaseConfig, TenantsConfig,
};
use crate::domain::ports::{is_valid_identifier, SqlExecutor};
use crate::domain::value_objects::{derive_webid, DeploymentTarget, StageKind, TemplateVars};
use crate::error::DatabaseError;
use crate::infrastructure::fs::walk_files;

fn with_scripts(target: DeploymentTarget, scripts: &ScriptPaths) -> DeploymentTarget {
    target
        .with_stage(StageKind::Setup, scripts.setup_path.clone())
        .with_stage(StageKind::Tables, scripts.tables_path.clone())
        .with_stage(StageKind::Procedures, scripts.procedures_path.clone())
        .with_stage(StageKind::Data, scripts.seeds_path.clone())
}

/// Variables shared by every target.
pub fn base_vars(db: &DatabaseConfig, application_name: Option<&str>) -> TemplateVars {
    let main = db.main_database_scripts.as_ref();
    TemplateVars::new()
        .with("ADMIN_USERNAME", Some(&db.admin_username))
        .with("ADMIN_PASSWORD", db.admin_password.as_deref())
        .with("MAIN_DB_NAME", main.map(|m| m.db_name.as_str()))
        .with("MAIN_DB_USERNAME", main.and_then(|m| m.db_username.as_deref()))
        .with("MAIN_DB_PASSWORD", main.and_then(|m| m.db_password.as_deref()))
        .with("APPLICATION_NAME", application_name)
}

pub fn main_target(
    db: &DatabaseConfig,
    main: &MainDatabaseConfig,
    application_name: Option<&str>,
) -> DeploymentTarget {
    with_scripts(DeploymentTarget::main(&main.db_name), &main.scripts)
        .with_template_vars(base_vars(db, application_name))
}

pub fn tenant_target(
    db: &DatabaseConfig,
    tenant: &TenantDatabaseConfig,
    database_name: &str,
    application_name: Option<&str>,
) -> DeploymentTarget {
    let webid = derive_webid(database_name, application_name);
    let username = tenant
        .db_username
        .as_deref()
        .map(|u| render_for_tenant(u, &webid));
    let mut vars = base_vars(db, application_name);
    vars.insert("TENANT_DB_NAME", Some(database_name));
    vars.insert("TENANT_DB_USERNAME", username.as_deref());
    vars.insert("TENANT_DB_PASSWORD", tenant.db_password.as_deref());
    vars.insert("TENANT_WEBID", Some(&webid));

    with_scripts(DeploymentTarget::tenant(database_name, webid), &tenant.scripts)
        .with_template_vars(vars)
}

/// Tenant database names rendered from the tenant profiles.
pub fn tenant_database_names(tenant: &TenantDatabaseConfig, profiles: &[TenantProfile]) -> Vec<String> {
    profiles
        .iter()
        .map(|p| render_for_tenant(&tenant.db_name, &p.webid))
        .collect()
}

/// Tenant database names from the first column of `query`, run against the
/// main database. Names that are not plain identifiers are dropped.
pub fn discover_tenant_databases(
    executor: &dyn SqlExecutor,
    query: &str,
    main_database: Option<&str>,
) -> Result<Vec<String>, DatabaseError> {
    let rows = executor
        .query(query, main_database)
        .map_err(DatabaseError::Discovery)?;
    let mut names = Vec::new();
    for row in rows {
        let Some(name) = row.into_iter().next().map(|n| n.trim().to_string()) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        if !is_valid_identifier(&name) {
            warn!("ignoring discovered tenant database '{}': not a plain identifier", name);
            continue;
        }
        names.push(name);
    }
    debug!(count = names.len(), "tenant databases discovered");
    Ok(names)
}

fn newer_than(path: &Path, watermark: f64) -> bool {
    match walk_files(path) {
        Ok(files) => files.iter().any(|f| f.modified > watermark),
        // Missing inputs have nothing to deploy.
        Err(_) => false,
    }
}

/// Whether any database input changed since `watermark`.
///
/// Looks at stage scripts, seed configs, seed table scripts and tenant
/// configs.
pub fn database_files_changed(
    db: &DatabaseConfig,
    tenants: Option<&TenantsConfig>,
    watermark: f64,
) -> bool {
    let mut inputs: Vec<&Path> = Vec::new();
    if let Some(main) = &db.main_database_scripts {
        inputs.extend(main.scripts.all().map(|p| p.as_path()));
    }
    if let Some(tenant) = db.enabled_tenant_database() {
        inputs.extend(tenant.scripts.all().map(|p| p.as_path()));
        if let Some(tenants) = tenants {
            inputs.push(&tenants.config_files_path);
        }
    }
    if let Some(seeds) = db.enabled_seed_tables() {
        if let Some(dir) = &seeds.config_files_path {
            inputs.push(dir);
        }
        inputs.extend(seeds.tables.iter().map(|t| t.table_script_file.as_path()));
    }

    match inputs.iter().find(|p| newer_than(p, watermark)) {
        Some(changed) => {
            debug!("database input changed: {}", changed.display());
            true
        }
        None => false,
    }
}
