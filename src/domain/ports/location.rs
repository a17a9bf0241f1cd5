//! Location port - a source or destination file tree
//!
//! Implemented by a direct filesystem backend (local directories and mounted
//! network shares) and by an SSH backend. Every path argument is relative to
//! the location root and is validated with `RelativePath::parse` before any
//! I/O happens.

use std::fmt;

use crate::domain::entities::FileRecord;
use crate::domain::value_objects::PathError;

/// Result type for location operations
pub type LocationResult<T> = Result<T, LocationError>;

/// Location operation errors
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    /// Could not reach or authenticate against the location
    Connection(String),
    /// Operation attempted before `connect`
    NotConnected,
    /// Path failed validation; nothing was touched
    InvalidPath(PathError),
    /// File does not exist
    NotFound(String),
    /// Read, write or delete failed
    Io(String),
    /// Remote command exited unsuccessfully
    CommandFailed { command: String, stderr: String },
    /// Backend does not offer this operation
    NotSupported(&'static str),
}

impl fmt::Display for LocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(msg) => write!(f, "connection failed: {}", msg),
            Self::NotConnected => write!(f, "location is not connected"),
            Self::InvalidPath(err) => write!(f, "invalid path: {}", err),
            Self::NotFound(path) => write!(f, "not found: {}", path),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::CommandFailed { command, stderr } => {
                write!(f, "remote command '{}' failed: {}", command, stderr.trim())
            }
            Self::NotSupported(what) => write!(f, "not supported by this location: {}", what),
        }
    }
}

impl std::error::Error for LocationError {}

impl From<PathError> for LocationError {
    fn from(err: PathError) -> Self {
        Self::InvalidPath(err)
    }
}

impl From<std::io::Error> for LocationError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(err.to_string())
        } else {
            Self::Io(err.to_string())
        }
    }
}

/// A file tree that can be listed, read and written.
///
/// Implementations are shared by reference across transfer workers, hence
/// `Send + Sync`. Backends that can only run one command at a time report
/// it through `requires_serialization`.
pub trait Location: Send + Sync {
    /// Human-readable description for logs, e.g. `ssh deploy@web01:/var/www`
    fn display_name(&self) -> String;

    fn connect(&self) -> LocationResult<()>;

    /// Release the underlying session. Safe to call more than once.
    fn disconnect(&self);

    /// List files (and directories, where the backend reports them).
    fn list_files(&self, recursive: bool) -> LocationResult<Vec<FileRecord>>;

    fn read_file(&self, path: &str) -> LocationResult<Vec<u8>>;

    /// Write a file, creating missing parent directories.
    fn write_file(&self, path: &str, content: &[u8]) -> LocationResult<()>;

    fn delete_file(&self, path: &str) -> LocationResult<()>;

    fn delete_directory(&self, path: &str) -> LocationResult<()>;

    /// True when concurrent commands on one handle are unsafe.
    fn requires_serialization(&self) -> bool {
        false
    }

    /// Run a shell command with the location root as working directory.
    fn run_command(&self, _command: &str) -> LocationResult<String> {
        Err(LocationError::NotSupported("remote commands"))
    }
}

/// Opens additional connected sessions to the same location.
pub trait SessionFactory: Send + Sync {
    fn open_session(&self) -> LocationResult<Box<dyn Location>>;
}
