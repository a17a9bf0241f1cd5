//! Configuration module
//!
//! A deployment is described by one JSON or TOML file. Loading happens in
//! three steps:
//! 1. Parse into a generic document and substitute `{{APPLICATION_NAME}}`
//! 2. Deserialize into typed sections, collecting unknown keys as warnings
//! 3. Validate, before anything touches the network

mod loader;
mod types;
mod validation;

use std::path::PathBuf;

use thiserror::Error;

pub use loader::{
    cache_path_for, expand_home, load_config, parse_config, ConfigWarning, LoadedConfig,
};
pub use types::{
    DatabaseConfig, DeployConfig, FileMapping, IgnoreConfig, LocationConfig, MainDatabaseConfig,
    OptionsConfig, ScriptPaths, SeedTablesConfig, ShareConfig, SshLocationConfig,
    TenantDatabaseConfig, TenantWebsiteConfig, TenantsConfig, WarnConfig, WebsiteConfig,
};
pub use validation::validate;

/// Configuration errors. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid config value {field}: {message}")]
    Invalid { field: String, message: String },
}
