//! Configuration type definitions
//!
//! One struct per config section. Defaults are applied by serde so every
//! consumer sees a fully populated value.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::SeedTableDefinition;

fn default_true() -> bool {
    true
}

fn default_ssh_port() -> u16 {
    22
}

fn default_db_host() -> String {
    "127.0.0.1".to_string()
}

fn default_db_port() -> u16 {
    3306
}

fn default_json_extension() -> String {
    ".json".to_string()
}

fn default_max_concurrent_transfers() -> usize {
    20
}

fn default_pool_threshold() -> usize {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    60
}

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub agent_name: Option<String>,

    /// Substituted for `{{APPLICATION_NAME}}` throughout the document
    #[serde(default)]
    pub application_name: Option<String>,

    /// Shown in the confirmation prompt
    #[serde(default)]
    pub description: Option<String>,

    pub source: LocationConfig,

    pub destination: LocationConfig,

    #[serde(default)]
    pub website: WebsiteConfig,

    #[serde(default)]
    pub tenants: Option<TenantsConfig>,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub warn: WarnConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

impl DeployConfig {
    /// Destination root: `destination.path`, else `website.path`.
    pub fn destination_root(&self) -> Option<&str> {
        self.destination.path().or(self.website.path.as_deref())
    }

    /// Database settings, when enabled.
    pub fn enabled_database(&self) -> Option<&DatabaseConfig> {
        self.database.as_ref().filter(|db| db.enabled)
    }
}

/// Source or destination backend, selected by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationConfig {
    /// Local directory or mounted network share
    #[serde(alias = "local")]
    WindowsShare(ShareConfig),
    Ssh(SshLocationConfig),
}

impl LocationConfig {
    pub fn path(&self) -> Option<&str> {
        match self {
            LocationConfig::WindowsShare(share) => share.path.as_deref(),
            LocationConfig::Ssh(ssh) => ssh.path.as_deref(),
        }
    }

    pub fn is_ssh(&self) -> bool {
        matches!(self, LocationConfig::Ssh(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshLocationConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub key_file: Option<PathBuf>,

    #[serde(default)]
    pub passphrase: Option<String>,

    #[serde(default)]
    pub path: Option<String>,
}

/// `source -> destination` copy outside the synced tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    /// Absolute local path, or a path relative to the source root
    pub source: String,
    /// Path relative to the destination root
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub folders: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebsiteConfig {
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub file_mappings: Vec<FileMapping>,

    /// Script relative to the destination root, run after changes
    #[serde(default)]
    pub set_permissions_script: Option<String>,

    #[serde(default)]
    pub ignore: IgnoreConfig,

    #[serde(default, rename = "tenant-website", alias = "tenant_website")]
    pub tenant_website: Option<TenantWebsiteConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantWebsiteConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Local asset directory, with `{{WEBID}}` standing for the tenant
    #[serde(default)]
    pub assets_path: Option<String>,

    /// Local directory holding pre-generated CSS, one subdirectory per tenant
    #[serde(default)]
    pub generated_css_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantsConfig {
    pub config_files_path: PathBuf,

    #[serde(default = "default_json_extension")]
    pub config_files_extension: String,
}

/// Script locations for one database kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptPaths {
    #[serde(default)]
    pub setup_path: Option<PathBuf>,
    #[serde(default)]
    pub tables_path: Option<PathBuf>,
    #[serde(default)]
    pub procedures_path: Option<PathBuf>,
    #[serde(default)]
    pub seeds_path: Option<PathBuf>,
}

impl ScriptPaths {
    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        [
            &self.setup_path,
            &self.tables_path,
            &self.procedures_path,
            &self.seeds_path,
        ]
        .into_iter()
        .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.all().next().is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainDatabaseConfig {
    pub db_name: String,
    #[serde(default)]
    pub db_username: Option<String>,
    #[serde(default)]
    pub db_password: Option<String>,
    #[serde(flatten)]
    pub scripts: ScriptPaths,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantDatabaseConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Database name template containing `{{WEBID}}`
    #[serde(default)]
    pub db_name: String,

    #[serde(default)]
    pub db_username: Option<String>,

    #[serde(default)]
    pub db_password: Option<String>,

    /// Query whose first column lists tenant database names
    #[serde(default)]
    pub discover_query: Option<String>,

    #[serde(flatten)]
    pub scripts: ScriptPaths,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedTablesConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub config_files_path: Option<PathBuf>,

    #[serde(default = "default_json_extension")]
    pub config_files_extension: String,

    #[serde(default)]
    pub tables: Vec<SeedTableDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub ssh_host: String,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    #[serde(default)]
    pub ssh_username: String,

    #[serde(default)]
    pub ssh_password: Option<String>,

    #[serde(default)]
    pub ssh_key_file: Option<PathBuf>,

    #[serde(default)]
    pub ssh_passphrase: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default)]
    pub admin_username: String,

    #[serde(default)]
    pub admin_password: Option<String>,

    #[serde(default)]
    pub main_database_scripts: Option<MainDatabaseConfig>,

    #[serde(default, rename = "tenant-database", alias = "tenant_database")]
    pub tenant_database: Option<TenantDatabaseConfig>,

    #[serde(default)]
    pub seed_tables: Option<SeedTablesConfig>,
}

impl DatabaseConfig {
    pub fn enabled_tenant_database(&self) -> Option<&TenantDatabaseConfig> {
        self.tenant_database.as_ref().filter(|t| t.enabled)
    }

    pub fn enabled_seed_tables(&self) -> Option<&SeedTablesConfig> {
        self.seed_tables.as_ref().filter(|s| s.enabled)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarnConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_true")]
    pub verbose: bool,

    #[serde(default)]
    pub ignore_cache: bool,

    #[serde(default)]
    pub clean_install: bool,

    #[serde(default = "default_true")]
    pub delete_extra_files: bool,

    #[serde(default = "default_max_concurrent_transfers")]
    pub max_concurrent_transfers: usize,

    /// Diff against the cache instead of listing the destination
    #[serde(default)]
    pub cache_only: bool,

    /// Minimum changed items before a connection pool is opened
    #[serde(default = "default_pool_threshold")]
    pub pool_threshold: usize,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            verbose: true,
            ignore_cache: false,
            clean_install: false,
            delete_extra_files: true,
            max_concurrent_transfers: default_max_concurrent_transfers(),
            cache_only: false,
            pool_threshold: default_pool_threshold(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}
