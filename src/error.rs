//! Error types for Stagehand
//!
//! Library errors use `thiserror`; `main` wraps them with `anyhow` context.

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::ports::{CacheError, LocationError, SqlError};
use crate::domain::value_objects::IgnoreError;
use crate::infrastructure::ssh::PoolError;

/// Result type alias for Stagehand operations
pub type StagehandResult<T> = Result<T, StagehandError>;

/// Main error type for a deployment run.
///
/// Only failures that leave the destination in a state the cache cannot
/// describe end up here. Per-file and per-script failures are aggregated in
/// reports instead.
#[derive(Error, Debug)]
pub enum StagehandError {
    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A location could not be reached
    #[error("failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: LocationError,
    },

    /// Listing or cleaning a location failed
    #[error(transparent)]
    Location(#[from] LocationError),

    /// Database phase failed before any script ran
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Ignore rules do not compile
    #[error("invalid ignore rules: {0}")]
    Ignore(#[from] IgnoreError),

    /// Connection pool could not be established
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Change cache could not be read or written
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Deployment was declined at the confirmation prompt
    #[error("deployment aborted by user")]
    Aborted,
}

/// Fatal errors raised by the database orchestrator.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("cannot reach database server: {0}")]
    Connection(SqlError),

    #[error("tenant discovery query failed: {0}")]
    Discovery(SqlError),
}
