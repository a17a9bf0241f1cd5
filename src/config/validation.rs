//! Configuration validation
//!
//! Runs once after loading so misconfiguration fails before any network I/O.

use std::path::Path;

use super::types::{DatabaseConfig, DeployConfig, LocationConfig, ScriptPaths, SshLocationConfig};
use super::ConfigError;
use crate::domain::ports::is_valid_identifier;

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

fn require_existing(field: &str, path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        Ok(())
    } else {
        Err(invalid(field, format!("path does not exist: {}", path.display())))
    }
}

pub fn validate(config: &DeployConfig) -> Result<(), ConfigError> {
    validate_location("source", &config.source)?;
    if config.source.path().is_none() {
        return Err(invalid("source.path", "is required"));
    }

    validate_location("destination", &config.destination)?;
    if config.destination_root().is_none() {
        return Err(invalid(
            "destination.path",
            "is required (or set website.path)",
        ));
    }

    if config.options.max_concurrent_transfers == 0 {
        return Err(invalid(
            "options.max_concurrent_transfers",
            "must be greater than 0",
        ));
    }

    if let Some(tenants) = &config.tenants {
        require_existing("tenants.config_files_path", &tenants.config_files_path)?;
    }

    if let Some(tenant_website) = config.website.tenant_website.as_ref().filter(|t| t.enabled) {
        if config.tenants.is_none() {
            return Err(invalid(
                "website.tenant-website",
                "requires a tenants section",
            ));
        }
        if tenant_website.assets_path.is_none() && tenant_website.generated_css_path.is_none() {
            return Err(invalid(
                "website.tenant-website",
                "needs assets_path or generated_css_path",
            ));
        }
    }

    if let Some(db) = config.enabled_database() {
        validate_database(db, config.tenants.is_some())?;
    }

    Ok(())
}

fn validate_location(name: &str, location: &LocationConfig) -> Result<(), ConfigError> {
    match location {
        LocationConfig::WindowsShare(_) => Ok(()),
        LocationConfig::Ssh(ssh) => validate_ssh(name, ssh),
    }
}

fn validate_ssh(name: &str, ssh: &SshLocationConfig) -> Result<(), ConfigError> {
    if ssh.host.trim().is_empty() {
        return Err(invalid(format!("{}.host", name), "is required for ssh"));
    }
    if ssh.username.trim().is_empty() {
        return Err(invalid(format!("{}.username", name), "is required for ssh"));
    }
    if ssh.password.is_none() && ssh.key_file.is_none() {
        return Err(invalid(name, "ssh needs either password or key_file"));
    }
    Ok(())
}

fn validate_scripts(field: &str, scripts: &ScriptPaths) -> Result<(), ConfigError> {
    if scripts.is_empty() {
        return Err(invalid(field, "needs at least one script path"));
    }
    for path in scripts.all() {
        require_existing(field, path)?;
    }
    Ok(())
}

fn validate_database(db: &DatabaseConfig, has_tenants: bool) -> Result<(), ConfigError> {
    if db.ssh_host.trim().is_empty() || db.ssh_username.trim().is_empty() {
        return Err(invalid("database", "ssh_host and ssh_username are required"));
    }
    if db.ssh_password.is_none() && db.ssh_key_file.is_none() {
        return Err(invalid(
            "database",
            "needs either ssh_password or ssh_key_file",
        ));
    }
    if db.admin_username.trim().is_empty() {
        return Err(invalid("database.admin_username", "is required"));
    }

    let main = db
        .main_database_scripts
        .as_ref()
        .ok_or_else(|| invalid("database.main_database_scripts", "is required"))?;
    if !is_valid_identifier(&main.db_name) {
        return Err(invalid(
            "database.main_database_scripts.db_name",
            format!("'{}' is not a valid database name", main.db_name),
        ));
    }
    validate_scripts("database.main_database_scripts", &main.scripts)?;

    if let Some(tenant) = db.enabled_tenant_database() {
        if !tenant.db_name.contains("{{WEBID}}") {
            return Err(invalid(
                "database.tenant-database.db_name",
                "must contain {{WEBID}}",
            ));
        }
        let sample = tenant.db_name.replace("{{WEBID}}", "x");
        if !is_valid_identifier(&sample) {
            return Err(invalid(
                "database.tenant-database.db_name",
                format!("'{}' is not a valid database name", tenant.db_name),
            ));
        }
        if tenant.discover_query.is_none() && !has_tenants {
            return Err(invalid(
                "database.tenant-database",
                "requires a tenants section or discover_query",
            ));
        }
        validate_scripts("database.tenant-database", &tenant.scripts)?;
    }

    if let Some(seeds) = db.enabled_seed_tables() {
        let dir = seeds
            .config_files_path
            .as_ref()
            .ok_or_else(|| invalid("database.seed_tables.config_files_path", "is required"))?;
        require_existing("database.seed_tables.config_files_path", dir)?;

        for (i, table) in seeds.tables.iter().enumerate() {
            let field = format!("database.seed_tables.tables[{}]", i);
            if table.table_name.trim().is_empty() {
                return Err(invalid(&field, "table_name is required"));
            }
            if table.begin_mark.is_empty() || table.end_mark.is_empty() {
                return Err(invalid(&field, "begin_mark and end_mark are required"));
            }
            if table.nested_array_field.is_some() && table.array_field.is_none() {
                return Err(invalid(&field, "nested_array_field requires array_field"));
            }
            require_existing(&field, &table.table_script_file)?;
        }
    }

    Ok(())
}
