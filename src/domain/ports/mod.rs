//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod cache_repository;
pub mod location;
pub mod password_hasher;
pub mod sql_executor;

pub use cache_repository::{CacheError, CacheRepository, CacheResult};
pub use location::{Location, LocationError, LocationResult, SessionFactory};
pub use password_hasher::PasswordHasher;
pub use sql_executor::{is_valid_identifier, SqlError, SqlExecutor, SqlResult};
