//! Scenario: Main and tenant databases deployed alongside files
//!
//! Journey: A multi-tenant shop ships schema changes with its code.
//!
//! Steps:
//! 1. First run creates the main database, every tenant database and seeds
//! 2. A run with no script edits skips the database phase entirely
//! 3. Touching one table script re-runs only that script, for every tenant

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};

use stagehand::config::{parse_config, DeployConfig};
use stagehand::infrastructure::LocalLocation;
use stagehand::{DeployOptions, DeployReport, DeployUseCase};

use crate::common::*;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

struct Shop {
    env: TestEnv,
    source: LocalLocation,
    destination: LocalLocation,
    cache: MemoryCache,
    server: RecordingExecutor,
}

impl Shop {
    fn new() -> Self {
        let env = TestEnv::new();
        env.write_source("index.php", "<?php", 100);
        env.write("tenants/acme.json", r#"{"webid": "acme"}"#, 1_000);
        env.write("tenants/globex.json", r#"{"webid": "globex"}"#, 1_000);
        env.write(
            "db/main/setup/01_create.sql",
            "CREATE DATABASE IF NOT EXISTS {{MAIN_DB_NAME}};",
            1_000,
        );
        env.write(
            "db/main/tables/users.sql",
            "CREATE TABLE IF NOT EXISTS users (id INT, name VARCHAR(64), password VARBINARY(64));",
            1_000,
        );
        env.write(
            "db/tenant/setup/01_create.sql",
            "CREATE DATABASE IF NOT EXISTS {{TENANT_DB_NAME}};",
            1_000,
        );
        env.write(
            "db/tenant/tables/orders.sql",
            "CREATE TABLE IF NOT EXISTS orders (id INT);",
            1_000,
        );
        env.write(
            "db/templates/users.sql",
            "-- BEGIN INSERT\nINSERT INTO users (name, password) VALUES ('{{NAME}}', '{{PASSWORD}}');\n-- END INSERT\n",
            1_000,
        );
        env.write(
            "db/seeds/users.json",
            r#"{"users": [{"name": "ada", "password": "pw1"}, {"name": "bob"}]}"#,
            1_000,
        );

        let source = LocalLocation::new(env.path("src"));
        let destination = LocalLocation::new(env.path("dst"));
        Self {
            env,
            source,
            destination,
            cache: MemoryCache::default(),
            server: RecordingExecutor::new(),
        }
    }

    fn config(&self) -> DeployConfig {
        let mut document = self.env.base_config();
        let extra: Value = json!({
            "tenants": {"config_files_path": self.env.path("tenants")},
            "database": {
                "enabled": true,
                "ssh_host": "db01",
                "ssh_username": "deploy",
                "ssh_password": "pw",
                "admin_username": "root",
                "admin_password": "secret",
                "main_database_scripts": {
                    "db_name": "{{APPLICATION_NAME}}",
                    "setup_path": self.env.path("db/main/setup"),
                    "tables_path": self.env.path("db/main/tables")
                },
                "tenant-database": {
                    "enabled": true,
                    "db_name": "{{APPLICATION_NAME}}_{{WEBID}}",
                    "setup_path": self.env.path("db/tenant/setup"),
                    "tables_path": self.env.path("db/tenant/tables")
                },
                "seed_tables": {
                    "enabled": true,
                    "config_files_path": self.env.path("db/seeds"),
                    "tables": [{
                        "table_name": "users",
                        "table_script_file": self.env.path("db/templates/users.sql"),
                        "begin_mark": "-- BEGIN INSERT",
                        "end_mark": "-- END INSERT",
                        "array_field": "users",
                        "database": "main",
                        "variables": [
                            {"sql_var": "{{NAME}}", "json_field": "name"},
                            {"sql_var": "{{PASSWORD}}", "json_field": "password"}
                        ]
                    }]
                }
            }
        });
        if let (Some(base), Some(extra)) = (document.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                base.insert(key.clone(), value.clone());
            }
        }
        parse_config(Path::new("shop.json"), &document.to_string())
            .expect("config parses")
            .0
    }

    fn deploy(&self) -> DeployReport {
        let config = self.config();
        DeployUseCase::new(
            &config,
            &self.cache,
            &self.source,
            &self.destination,
            &PlainHasher,
        )
        .with_database(&self.server)
        .execute(&DeployOptions::new(self.env.path("cache.json")))
        .expect("deployment succeeds")
    }
}

fn position(statements: &[String], needle: &str) -> usize {
    statements
        .iter()
        .position(|s| s.contains(needle))
        .unwrap_or_else(|| panic!("'{}' was not executed: {:#?}", needle, statements))
}

/// SCENARIO: first deployment builds everything in stage order
#[test]
fn scenario_first_deployment_creates_all_databases() {
    let shop = Shop::new();

    let report = shop.deploy();
    assert!(report.is_success());
    let database = report.database.expect("database phase ran");
    assert!(database.success);
    assert_eq!(database.targets.len(), 3);
    assert_eq!(database.records_inserted, 2);

    for name in ["shop", "shop_acme", "shop_globex"] {
        assert!(shop.server.has_database(name), "{} missing", name);
    }

    let statements = shop.server.statements();
    let main_setup = position(&statements, "CREATE DATABASE IF NOT EXISTS shop;");
    let main_tables = position(&statements, "CREATE TABLE IF NOT EXISTS users");
    let acme_setup = position(&statements, "CREATE DATABASE IF NOT EXISTS shop_acme;");
    let acme_use = position(&statements, "USE shop_acme");
    let globex_setup = position(&statements, "CREATE DATABASE IF NOT EXISTS shop_globex;");
    assert!(main_setup < main_tables);
    assert!(main_tables < acme_setup);
    assert!(acme_setup < acme_use);
    assert!(acme_use < globex_setup);

    let orders: Vec<_> = shop
        .server
        .executed()
        .into_iter()
        .filter(|e| e.sql.contains("orders"))
        .map(|e| e.database)
        .collect();
    assert_eq!(
        orders,
        vec![Some("shop_acme".to_string()), Some("shop_globex".to_string())]
    );

    let inserts: Vec<_> = statements
        .iter()
        .filter(|s| s.starts_with("INSERT INTO users"))
        .cloned()
        .collect();
    assert_eq!(
        inserts,
        vec![
            format!(
                "INSERT INTO users (name, password) VALUES ('ada', UNHEX('{}'));",
                hex::encode("hash:pw1")
            ),
            "INSERT INTO users (name, password) VALUES ('bob', NULL);".to_string(),
        ]
    );

    assert!(shop.cache.snapshot().watermark().is_some());
}

/// SCENARIO: nothing changed since the watermark, nothing executed
#[test]
fn scenario_unchanged_scripts_skip_database_phase() {
    let shop = Shop::new();
    shop.deploy();
    shop.server.clear();

    let report = shop.deploy();
    assert!(report.is_success());
    assert!(report.database.is_none());
    assert!(shop.server.executed().is_empty());
}

/// SCENARIO: one edited script runs again for every tenant, nothing else does
#[test]
fn scenario_edited_table_script_reruns_for_each_tenant() {
    let shop = Shop::new();
    shop.deploy();
    shop.server.clear();

    shop.env.write(
        "db/tenant/tables/orders.sql",
        "CREATE TABLE IF NOT EXISTS orders (id INT, total INT);",
        now_secs() + 3_600,
    );
    let report = shop.deploy();
    let database = report.database.expect("database phase ran");
    assert!(database.success);

    let statements = shop.server.statements();
    let orders = statements
        .iter()
        .filter(|s| s.contains("orders (id INT, total INT)"))
        .count();
    assert_eq!(orders, 2, "{:#?}", statements);
    assert!(!statements.iter().any(|s| s.contains("CREATE DATABASE")));
    assert!(!statements.iter().any(|s| s.contains("users (id INT")));
}
