//! SQL script execution
//!
//! Files are read locally, rendered with the target's template variables,
//! normalized to LF line endings and handed to the executor.

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use crate::domain::ports::{SqlError, SqlExecutor, SqlResult};
use crate::domain::value_objects::TemplateVars;
use crate::infrastructure::fs::{walk_files, WalkedFile};

/// Outcome of running a stage path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub success: bool,
    /// Files executed (or that would be, in a dry run)
    pub executed: usize,
}

/// CRLF and lone CR become LF.
pub fn normalize_line_endings(sql: &str) -> String {
    sql.replace("\r\n", "\n").replace('\r', "\n")
}

/// `.sql` files under `path` in lexical order; a file path yields itself.
pub fn collect_sql_files(path: &Path) -> std::io::Result<Vec<WalkedFile>> {
    let is_file = path.is_file();
    let files = walk_files(path)?;
    Ok(files
        .into_iter()
        .filter(|f| is_file || f.relative.ends_with(".sql"))
        .collect())
}

pub struct ScriptRunner<'a> {
    executor: &'a dyn SqlExecutor,
    dry_run: bool,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(executor: &'a dyn SqlExecutor) -> Self {
        Self {
            executor,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn execute_sql_command(&self, sql: &str, database: Option<&str>) -> SqlResult<()> {
        if self.dry_run {
            info!("[dry run] would execute SQL: {}", sql);
            return Ok(());
        }
        debug!("executing SQL: {}", sql);
        self.executor
            .execute_sql(&normalize_line_endings(sql), database)
    }

    /// Execute one file. `use_database` selects `database` for the session;
    /// setup scripts run without one.
    pub fn execute_sql_file(
        &self,
        path: &Path,
        use_database: bool,
        vars: &TemplateVars,
        database: Option<&str>,
    ) -> SqlResult<()> {
        let content = fs::read_to_string(path).map_err(|e| SqlError::Script {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        if self.dry_run {
            info!("[dry run] would execute: {}", name);
            return Ok(());
        }

        let sql = normalize_line_endings(&vars.render(&content));
        let database = if use_database { database } else { None };
        match self.executor.execute_sql(&sql, database) {
            Ok(()) => {
                info!("executed {}", name);
                Ok(())
            }
            Err(e) => {
                error!("error executing {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// Execute every `.sql` file under `path` whose mtime is strictly greater
    /// than `since`. A failing file marks the outcome failed; the rest still run.
    pub fn execute_sql_directory(
        &self,
        path: &Path,
        use_database: bool,
        vars: &TemplateVars,
        database: Option<&str>,
        since: Option<f64>,
    ) -> ScriptOutcome {
        let files = match collect_sql_files(path) {
            Ok(files) => files,
            Err(e) => {
                error!("script path {} not readable: {}", path.display(), e);
                return ScriptOutcome {
                    success: false,
                    executed: 0,
                };
            }
        };
        if files.is_empty() {
            info!("no SQL files found in {}", path.display());
            return ScriptOutcome {
                success: true,
                executed: 0,
            };
        }

        let total = files.len();
        let pending: Vec<WalkedFile> = files
            .into_iter()
            .filter(|f| since.map_or(true, |watermark| f.modified > watermark))
            .collect();
        if pending.len() < total {
            debug!("skipped {} unchanged SQL file(s)", total - pending.len());
        }
        if pending.is_empty() {
            info!("no SQL files need to be executed in {}", path.display());
        }

        let mut success = true;
        for file in &pending {
            if self
                .execute_sql_file(&file.absolute, use_database, vars, database)
                .is_err()
            {
                success = false;
            }
        }
        ScriptOutcome {
            success,
            executed: pending.len(),
        }
    }
}
