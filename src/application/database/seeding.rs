//! Declarative table seeding
//!
//! Every JSON document in the seed directory is bound into the INSERT
//! template of each configured table. Arrays fan out into one statement per
//! element; a count query can skip tables that already hold data.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::SeedTablesConfig;
use crate::domain::ports::{PasswordHasher, SqlExecutor};
use crate::domain::services::{bind_template, extract_template, lookup, BindSource};
use crate::domain::value_objects::{SeedDatabase, SeedTableDefinition};
use crate::infrastructure::fs::list_dir_files;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub success: bool,
    pub records_inserted: usize,
}

impl SeedReport {
    fn ok() -> Self {
        Self {
            success: true,
            records_inserted: 0,
        }
    }

    fn failed() -> Self {
        Self {
            success: false,
            records_inserted: 0,
        }
    }

    fn absorb(&mut self, other: SeedReport) {
        self.success &= other.success;
        self.records_inserted += other.records_inserted;
    }
}

/// Database name a tenant seed document belongs to.
pub fn expected_tenant_database(document: &Value, application_name: Option<&str>) -> String {
    let webid = document.get("webid").and_then(Value::as_str).unwrap_or("");
    match application_name {
        Some(app) => format!("{}_{}", app, webid),
        None => webid.to_string(),
    }
}

/// `document` overlaid with the keys of `outer` (outer keys win).
fn merge_context(document: &Value, outer: &Value) -> Value {
    let mut merged: Map<String, Value> = document.as_object().cloned().unwrap_or_default();
    if let Some(outer) = outer.as_object() {
        for (key, value) in outer {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

pub struct Seeder<'a> {
    executor: &'a dyn SqlExecutor,
    hasher: &'a dyn PasswordHasher,
    dry_run: bool,
}

impl<'a> Seeder<'a> {
    pub fn new(executor: &'a dyn SqlExecutor, hasher: &'a dyn PasswordHasher) -> Self {
        Self {
            executor,
            hasher,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Seed `database_name` with the tables whose kind matches `is_tenant`.
    pub fn seed_from_config(
        &self,
        config: &SeedTablesConfig,
        database_name: &str,
        is_tenant: bool,
        application_name: Option<&str>,
    ) -> SeedReport {
        if !config.enabled {
            debug!("table seeding is disabled");
            return SeedReport::ok();
        }
        let wanted = if is_tenant {
            SeedDatabase::Tenant
        } else {
            SeedDatabase::Main
        };
        let tables: Vec<&SeedTableDefinition> = config
            .tables
            .iter()
            .filter(|t| t.database == wanted)
            .collect();
        if tables.is_empty() {
            return SeedReport::ok();
        }

        let Some(dir) = config.config_files_path.as_deref().filter(|d| d.is_dir()) else {
            error!(
                "seed config path not found: {}",
                config
                    .config_files_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()
            );
            return SeedReport::failed();
        };
        let files = match list_dir_files(dir) {
            Ok(files) => files,
            Err(e) => {
                error!("cannot read seed configs in {}: {}", dir.display(), e);
                return SeedReport::failed();
            }
        };
        let files: Vec<_> = files
            .into_iter()
            .filter(|f| f.relative.ends_with(&config.config_files_extension))
            .collect();
        if files.is_empty() {
            warn!("no seed config files found in {}", dir.display());
            return SeedReport::ok();
        }

        let mut report = SeedReport::ok();
        for file in &files {
            let document: Value = match fs::read_to_string(&file.absolute)
                .map_err(|e| e.to_string())
                .and_then(|c| serde_json::from_str(&c).map_err(|e| e.to_string()))
            {
                Ok(document) => document,
                Err(e) => {
                    error!("malformed seed file {}: {}", file.relative, e);
                    report.success = false;
                    continue;
                }
            };

            if is_tenant {
                let expected = expected_tenant_database(&document, application_name);
                if expected != database_name {
                    debug!(
                        "skipping {}: belongs to '{}', not '{}'",
                        file.relative, expected, database_name
                    );
                    continue;
                }
            }

            for table in &tables {
                report.absorb(self.seed_table(table, &document, &file.relative, database_name));
            }
        }

        info!(
            target: "summary",
            "seeded {}: {} record(s) from {} file(s)",
            database_name,
            report.records_inserted,
            files.len()
        );
        report
    }

    fn seed_table(
        &self,
        table: &SeedTableDefinition,
        document: &Value,
        file_name: &str,
        database_name: &str,
    ) -> SeedReport {
        info!("processing table {}", table.table_name);

        if let Some(query) = &table.check_exists_query {
            if self.has_data(query, table, document, database_name) {
                // One count for the whole document, even for array tables.
                if table.array_field.is_some() {
                    info!("skipping {}: data already exists for this tenant", table.table_name);
                } else {
                    info!("skipping {}: record already exists", table.table_name);
                }
                return SeedReport::ok();
            }
        }

        let Some(template) = self.load_template(table) else {
            return SeedReport::failed();
        };

        let mut report = SeedReport::ok();
        match &table.array_field {
            None => {
                report.absorb(self.insert(
                    &template,
                    table,
                    BindSource::document(document),
                    file_name,
                    database_name,
                ));
            }
            Some(array_field) => {
                let Some(elements) = lookup(document, array_field).and_then(Value::as_array)
                else {
                    debug!("array field '{}' not found or empty in {}", array_field, file_name);
                    return report;
                };

                match &table.nested_array_field {
                    None => {
                        for element in elements {
                            let source = BindSource {
                                element,
                                parent: Some(document),
                            };
                            report.absorb(self.insert(
                                &template,
                                table,
                                source,
                                file_name,
                                database_name,
                            ));
                        }
                    }
                    Some(nested_field) => {
                        for outer in elements {
                            let Some(inner) =
                                lookup(outer, nested_field).and_then(Value::as_array)
                            else {
                                continue;
                            };
                            let parent = merge_context(document, outer);
                            for element in inner {
                                let source = BindSource {
                                    element,
                                    parent: Some(&parent),
                                };
                                report.absorb(self.insert(
                                    &template,
                                    table,
                                    source,
                                    file_name,
                                    database_name,
                                ));
                            }
                        }
                    }
                }
                if report.records_inserted > 0 {
                    info!(
                        "inserted {} record(s) into {}",
                        report.records_inserted, table.table_name
                    );
                }
            }
        }
        report
    }

    fn load_template(&self, table: &SeedTableDefinition) -> Option<String> {
        let path: &Path = &table.table_script_file;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("cannot read table script {}: {}", path.display(), e);
                return None;
            }
        };
        let template = extract_template(&content, &table.begin_mark, &table.end_mark);
        if template.is_none() {
            error!(
                "no SQL template between '{}' and '{}' in {}",
                table.begin_mark,
                table.end_mark,
                path.display()
            );
        }
        template
    }

    fn insert(
        &self,
        template: &str,
        table: &SeedTableDefinition,
        source: BindSource<'_>,
        file_name: &str,
        database_name: &str,
    ) -> SeedReport {
        let bound = match bind_template(template, &table.variables, source, self.hasher) {
            Ok(bound) => bound,
            Err(e) => {
                error!("cannot bind {} for table {}: {}", file_name, table.table_name, e);
                return SeedReport::failed();
            }
        };
        for missing in &bound.missing {
            warn!(
                "JSON field '{}' not found in file '{}' for table '{}', using NULL for {}",
                missing.json_field, file_name, table.table_name, missing.sql_var
            );
        }

        if self.dry_run {
            info!("[dry run] would insert into {}: {}", table.table_name, bound.sql);
            return SeedReport::ok();
        }

        match self.executor.execute_sql(&bound.sql, Some(database_name)) {
            Ok(()) => SeedReport {
                success: true,
                records_inserted: 1,
            },
            Err(e) => {
                error!("insert into {} failed: {}", table.table_name, e);
                SeedReport::failed()
            }
        }
    }

    /// Run the count query. Anything but a positive integer means "no data".
    fn has_data(
        &self,
        query: &str,
        table: &SeedTableDefinition,
        document: &Value,
        database_name: &str,
    ) -> bool {
        if self.dry_run {
            return false;
        }
        let bound = match bind_template(
            query,
            &table.variables,
            BindSource::document(document),
            self.hasher,
        ) {
            Ok(bound) => bound,
            Err(e) => {
                error!("cannot bind check query for {}: {}", table.table_name, e);
                return false;
            }
        };
        debug!("check query: {}", bound.sql);

        let rows = match self.executor.query(&bound.sql, Some(database_name)) {
            Ok(rows) => rows,
            Err(e) if e.is_missing_table() => {
                debug!("check query failed, table may not exist yet: {}", e);
                return false;
            }
            Err(e) => {
                error!("check query for {} failed: {}", table.table_name, e);
                return false;
            }
        };

        let raw = rows
            .first()
            .and_then(|row| row.first())
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default();
        match raw.parse::<i64>() {
            Ok(count) => {
                debug!("check query returned {}", count);
                count > 0
            }
            Err(_) => {
                error!("invalid count result from check query: '{}'", raw);
                false
            }
        }
    }
}
