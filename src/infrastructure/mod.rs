//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all I/O operations.
//!
//! ## Structure
//!
//! - `fs/` - Location backends (local/share, SSH)
//! - `ssh/` - SSH sessions, remote commands, connection pool
//! - `database/` - SQL executor over SSH
//! - `repositories/` - Change cache persistence
//! - `password` - bcrypt hashing for seed data

pub mod database;
pub mod fs;
pub mod password;
pub mod repositories;
pub mod ssh;

pub use database::RemoteMysql;
pub use fs::{build_location, LocalLocation, LocationHandle, SshLocation, SshSessionFactory};
pub use password::BcryptHasher;
pub use repositories::JsonCacheRepository;
pub use ssh::{ConnectionPool, PoolError};
