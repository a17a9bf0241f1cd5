//! In-memory stand-ins for the database server, cache store and hasher.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use stagehand::domain::entities::ChangeCache;
use stagehand::domain::ports::{
    CacheRepository, CacheResult, PasswordHasher, SqlError, SqlExecutor, SqlResult,
};

/// One statement seen by `RecordingExecutor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub sql: String,
    pub database: Option<String>,
}

/// SQL server double. `CREATE DATABASE` and `DROP DATABASE` update the set
/// of known databases; count queries return `existing_rows`.
#[derive(Default)]
pub struct RecordingExecutor {
    databases: Mutex<HashSet<String>>,
    executed: Mutex<Vec<Executed>>,
    pub existing_rows: u64,
    pub tenant_rows: Vec<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_databases(self, names: &[&str]) -> Self {
        self.databases
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.lock().unwrap().clone()
    }

    pub fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|e| e.sql).collect()
    }

    pub fn clear(&self) {
        self.executed.lock().unwrap().clear();
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.lock().unwrap().contains(name)
    }
}

fn database_name(sql: &str, prefix: &str) -> Option<String> {
    let upper = sql.to_uppercase();
    let start = upper.find(prefix)? + prefix.len();
    let name = sql[start..]
        .split(|c: char| c.is_whitespace() || c == ';')
        .find(|s| !s.is_empty())?;
    Some(name.trim_matches('`').to_string())
}

impl SqlExecutor for RecordingExecutor {
    fn connect(&self) -> SqlResult<()> {
        Ok(())
    }

    fn disconnect(&self) {}

    fn database_exists(&self, name: &str) -> SqlResult<bool> {
        Ok(self.has_database(name))
    }

    fn execute_sql(&self, sql: &str, database: Option<&str>) -> SqlResult<()> {
        if let Some(name) = database_name(sql, "CREATE DATABASE IF NOT EXISTS ") {
            self.databases.lock().unwrap().insert(name);
        } else if let Some(name) = database_name(sql, "DROP DATABASE IF EXISTS ") {
            self.databases.lock().unwrap().remove(&name);
        }
        self.executed.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            database: database.map(str::to_string),
        });
        Ok(())
    }

    fn query(&self, sql: &str, _database: Option<&str>) -> SqlResult<Vec<Vec<String>>> {
        if sql.to_uppercase().contains("COUNT(") {
            return Ok(vec![vec![self.existing_rows.to_string()]]);
        }
        if self.tenant_rows.is_empty() {
            return Err(SqlError::Transport(format!("unexpected query: {}", sql)));
        }
        Ok(self.tenant_rows.iter().map(|r| vec![r.clone()]).collect())
    }
}

/// Cache store kept in memory between runs.
#[derive(Default)]
pub struct MemoryCache {
    stored: Mutex<Option<ChangeCache>>,
}

impl MemoryCache {
    pub fn snapshot(&self) -> ChangeCache {
        self.stored.lock().unwrap().clone().unwrap_or_default()
    }
}

impl CacheRepository for &MemoryCache {
    fn load_or_new(&self, _path: &Path) -> CacheResult<ChangeCache> {
        Ok(self.snapshot())
    }

    fn save(&self, cache: &ChangeCache, _path: &Path) -> CacheResult<()> {
        *self.stored.lock().unwrap() = Some(cache.clone());
        Ok(())
    }
}

/// Deterministic hasher: `hash:<plain>`.
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, plain: &str) -> Result<String, String> {
        Ok(format!("hash:{}", plain))
    }
}
