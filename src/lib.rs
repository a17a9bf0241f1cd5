//! Stagehand - incremental file and database deployment
//!
//! Stagehand keeps a destination tree in step with a source tree and, in the
//! same run, applies SQL setup, table, procedure and seed scripts to a main
//! database and any number of tenant databases reached over SSH. Only what
//! changed since the previous run is transferred or executed.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// Re-exports for convenience
pub use application::{DeployOptions, DeployReport, DeployUseCase};
pub use config::{load_config, DeployConfig};
pub use domain::entities::{ChangeCache, ChangeSet, FileRecord};
pub use domain::services::Differ;
pub use error::{StagehandError, StagehandResult};
