//! MySQL over SSH
//!
//! Runs the `mysql` client on the database host. Credentials go into a
//! `0600` client options file uploaded at connect time; every statement is
//! staged as `/tmp/deploy_sql_<hash>.sql` through stdin, executed, then
//! removed, so nothing sensitive ever appears in a process list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::domain::ports::{is_valid_identifier, LocationError, SqlError, SqlExecutor, SqlResult};
use crate::infrastructure::ssh::{shell_quote, RemoteCommand, SshSession, SshTarget};

/// ssh reports its own failures with this status.
const SSH_FAILURE_STATUS: i32 = 255;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MysqlCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
}

impl MysqlCredentials {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            host: config.db_host.clone(),
            port: config.db_port,
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        }
    }

    /// Body of the `[client]` options file.
    fn options_file(&self) -> String {
        let mut body = format!(
            "[client]\nhost={}\nport={}\nuser={}\n",
            self.host,
            self.port,
            quote_option(&self.username)
        );
        if let Some(password) = &self.password {
            body.push_str(&format!("password={}\n", quote_option(password)));
        }
        body
    }
}

/// Double-quote an option value; the client unescapes `\\` and `\"`.
fn quote_option(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Split `mysql -N -B` output into rows of columns.
fn parse_rows(output: &str) -> Vec<Vec<String>> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

/// Escape a name for use inside a `LIKE` string literal.
fn like_literal(name: &str) -> String {
    name.replace('_', "\\_")
}

pub struct RemoteMysql {
    session: SshSession,
    credentials: MysqlCredentials,
    options_path: Mutex<Option<String>>,
    staged: AtomicU64,
}

impl std::fmt::Debug for RemoteMysql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMysql")
            .field("target", self.session.target())
            .field("db_host", &self.credentials.host)
            .field("db_port", &self.credentials.port)
            .finish()
    }
}

impl RemoteMysql {
    pub fn new(target: SshTarget, credentials: MysqlCredentials) -> Self {
        Self {
            session: SshSession::new(target),
            credentials,
            options_path: Mutex::new(None),
            staged: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(
            SshTarget::from_database(config),
            MysqlCredentials::from_config(config),
        )
    }

    fn options_path(&self) -> SqlResult<String> {
        self.options_path
            .lock()
            .map_err(|_| SqlError::Transport("executor state poisoned".to_string()))?
            .clone()
            .ok_or(SqlError::NotConnected)
    }

    /// Unique staging file name for one payload.
    fn staging_path(&self, sql: &str) -> String {
        let sequence = self.staged.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let mut hasher = Sha256::new();
        hasher.update(sql.as_bytes());
        hasher.update(sequence.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("/tmp/deploy_sql_{}.sql", &digest[..16])
    }

    /// Stage `sql`, run the client against it, remove the file.
    fn run_client(&self, sql: &str, database: Option<&str>, tabular: bool) -> SqlResult<String> {
        if let Some(db) = database {
            if !is_valid_identifier(db) {
                return Err(SqlError::InvalidIdentifier(db.to_string()));
            }
        }
        let options = self.options_path()?;
        let staged = self.staging_path(sql);

        let mut client = RemoteCommand::new("mysql")
            .raw(&format!("--defaults-extra-file={}", shell_quote(&options)));
        if tabular {
            client = client.raw("-N").raw("-B");
        }
        if let Some(db) = database {
            client = client.arg(db);
        }
        let command = format!(
            "umask 077 && cat > {file} && {{ {client} < {file}; status=$?; rm -f {file}; exit $status; }}",
            file = shell_quote(&staged),
            client = client.build(),
        );

        let output = self
            .session
            .output(&command, Some(sql.as_bytes()))
            .map_err(transport)?;
        let status = output.status.code().unwrap_or(SSH_FAILURE_STATUS);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if status == SSH_FAILURE_STATUS {
            return Err(SqlError::Transport(stderr));
        }
        if status != 0 {
            return Err(SqlError::Command { status, stderr });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn transport(err: LocationError) -> SqlError {
    match err {
        LocationError::NotConnected => SqlError::NotConnected,
        other => SqlError::Transport(other.to_string()),
    }
}

impl SqlExecutor for RemoteMysql {
    fn connect(&self) -> SqlResult<()> {
        if self.options_path().is_ok() {
            return Ok(());
        }
        self.session.connect().map_err(transport)?;

        let upload = RemoteCommand::new("umask")
            .raw("077")
            .and(RemoteCommand::new("f=$(mktemp /tmp/deploy_mysql_XXXXXXXX)"))
            .and(RemoteCommand::new("cat").raw("> \"$f\""))
            .and(RemoteCommand::new("echo").raw("\"$f\""));
        let body = self.credentials.options_file();
        let stdout = self
            .session
            .run(&upload.build(), Some(body.as_bytes()))
            .map_err(transport)?;
        let path = String::from_utf8_lossy(&stdout).trim().to_string();
        if path.is_empty() {
            return Err(SqlError::Transport(
                "could not create client options file".to_string(),
            ));
        }
        {
            let mut guard = self
                .options_path
                .lock()
                .map_err(|_| SqlError::Transport("executor state poisoned".to_string()))?;
            *guard = Some(path);
        }

        self.query("SELECT 1", None)?;
        debug!(host = %self.credentials.host, "database server reachable");
        Ok(())
    }

    fn disconnect(&self) {
        let path = self.options_path.lock().ok().and_then(|mut g| g.take());
        if let Some(path) = path {
            let rm = RemoteCommand::new("rm").raw("-f").arg(&path);
            if let Err(e) = self.session.run(&rm.build(), None) {
                warn!("failed to remove client options file {}: {}", path, e);
            }
        }
        self.session.disconnect();
    }

    fn database_exists(&self, name: &str) -> SqlResult<bool> {
        if !is_valid_identifier(name) {
            return Err(SqlError::InvalidIdentifier(name.to_string()));
        }
        let rows = self.query(
            &format!("SHOW DATABASES LIKE '{}'", like_literal(name)),
            None,
        )?;
        Ok(rows
            .iter()
            .any(|row| row.first().map(|c| c == name).unwrap_or(false)))
    }

    fn execute_sql(&self, sql: &str, database: Option<&str>) -> SqlResult<()> {
        self.run_client(sql, database, false).map(|_| ())
    }

    fn query(&self, sql: &str, database: Option<&str>) -> SqlResult<Vec<Vec<String>>> {
        let output = self.run_client(sql, database, true)?;
        Ok(parse_rows(&output))
    }
}

impl Drop for RemoteMysql {
    fn drop(&mut self) {
        self.disconnect();
    }
}
