//! SSH plumbing
//!
//! - `command` - quoted remote command construction
//! - `session` - ControlMaster-backed sessions over the system `ssh` client
//! - `pool` - fixed-size pool of pre-connected sessions

pub mod command;
pub mod pool;
pub mod session;

use std::time::Duration;

use thiserror::Error;

use crate::domain::ports::LocationError;

pub use command::{remote_join, shell_quote, RemoteCommand};
pub use pool::{ConnectionPool, PooledSession};
pub use session::{SshSession, SshTarget};

/// Connection pool errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// No session became free in time. Recorded per item, never fatal.
    #[error("no pooled session became available within {0:?}")]
    Timeout(Duration),

    /// A session could not be opened while filling the pool.
    #[error("cannot open pooled session: {0}")]
    Connection(LocationError),

    #[error("connection pool is closed")]
    Closed,
}
