//! Domain Layer
//!
//! Deployment logic that does not depend on how files or SQL reach their
//! destination.
//!
//! ## Structure
//!
//! - `entities/` - FileRecord, ChangeSet, ChangeCache
//! - `value_objects/` - RelativePath, IgnorePatterns, StageKind, DeploymentTarget
//! - `services/` - Differ, SQL seed templates
//! - `ports/` - Location, SqlExecutor, CacheRepository, PasswordHasher

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
