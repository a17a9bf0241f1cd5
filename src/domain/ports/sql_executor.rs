//! SqlExecutor port - remote SQL execution
//!
//! The orchestrator and the seeding engine only need five primitives. File
//! and directory execution are layered on top in `ScriptRunner`.

use thiserror::Error;

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;

/// SQL execution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlError {
    /// The SQL client ran and reported a failure
    #[error("mysql exited with status {status}: {stderr}")]
    Command { status: i32, stderr: String },

    /// The session carrying the client failed (ssh, upload, cleanup)
    #[error("transport error: {0}")]
    Transport(String),

    /// Database name is not a plain identifier
    #[error("invalid database identifier '{0}'")]
    InvalidIdentifier(String),

    /// Local script could not be read
    #[error("cannot read script {path}: {message}")]
    Script { path: String, message: String },

    #[error("not connected to the database server")]
    NotConnected,
}

impl SqlError {
    /// Missing-table failures are expected when probing fresh databases.
    pub fn is_missing_table(&self) -> bool {
        match self {
            SqlError::Command { stderr, .. } => {
                stderr.contains("ERROR 1146") || stderr.contains("doesn't exist")
            }
            _ => false,
        }
    }
}

/// Executes SQL against a database server.
///
/// Implementations must stage every payload out of band (never on a command
/// line) so values such as bcrypt hashes survive untouched.
pub trait SqlExecutor: Send + Sync {
    fn connect(&self) -> SqlResult<()>;

    fn disconnect(&self);

    fn database_exists(&self, name: &str) -> SqlResult<bool>;

    /// Execute statements, optionally with a database selected.
    fn execute_sql(&self, sql: &str, database: Option<&str>) -> SqlResult<()>;

    /// Run a query and return tab-separated rows without headers.
    fn query(&self, sql: &str, database: Option<&str>) -> SqlResult<Vec<Vec<String>>>;
}

/// Database names are spliced into `USE` and `DROP` statements, so they must
/// be plain identifiers.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
