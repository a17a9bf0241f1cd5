//! Configuration loading

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::types::{DeployConfig, LocationConfig};
use super::validation;
use super::ConfigError;

/// Placeholder replaced by `application_name` throughout the document.
const APPLICATION_NAME_PLACEHOLDER: &str = "{{APPLICATION_NAME}}";

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    /// Full dotted path of the unknown key
    pub key: String,
    pub file: PathBuf,
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown config key '{}' in {}", self.key, self.file.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// A validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: DeployConfig,
    pub path: PathBuf,
    pub warnings: Vec<ConfigWarning>,
}

impl LoadedConfig {
    /// Cache document stored next to the config file.
    pub fn cache_path(&self) -> PathBuf {
        cache_path_for(&self.path)
    }
}

/// `.deploy_cache_<stem>.json` in the config file's directory.
pub fn cache_path_for(config_path: &Path) -> PathBuf {
    let stem = config_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("config");
    let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".deploy_cache_{}.json", stem))
}

/// Load, substitute, deserialize and validate a config file.
///
/// `.toml` files are parsed as TOML, everything else as JSON.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (config, warnings) = parse_config(path, &content)?;
    validation::validate(&config)?;

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        warnings,
    })
}

/// Parse without validating. Collects unknown keys as warnings.
pub fn parse_config(
    path: &Path,
    content: &str,
) -> Result<(DeployConfig, Vec<ConfigWarning>), ConfigError> {
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

    let mut document: Value = if is_toml {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
    };

    if let Some(app) = document
        .get("application_name")
        .and_then(Value::as_str)
        .map(str::to_string)
    {
        substitute_application_name(&mut document, &app, true);
    }

    let mut unknown_paths: Vec<String> = Vec::new();
    let mut config: DeployConfig = serde_ignored::deserialize(document, |p| {
        unknown_paths.push(p.to_string());
    })
    .map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    expand_key_files(&mut config);

    let warnings = unknown_paths
        .into_iter()
        .map(|key| {
            let leaf = key.split('.').next_back().unwrap_or(key.as_str()).to_string();
            ConfigWarning {
                line: find_line_number(content, &leaf),
                suggestion: suggest_key(&leaf),
                file: path.to_path_buf(),
                key,
            }
        })
        .collect();

    Ok((config, warnings))
}

/// Replace `{{APPLICATION_NAME}}` in every string except the name itself.
fn substitute_application_name(value: &mut Value, app: &str, top_level: bool) {
    match value {
        Value::String(text) if text.contains(APPLICATION_NAME_PLACEHOLDER) => {
            *text = text.replace(APPLICATION_NAME_PLACEHOLDER, app);
        }
        Value::Array(items) => {
            for item in items {
                substitute_application_name(item, app, false);
            }
        }
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if top_level && key == "application_name" {
                    continue;
                }
                substitute_application_name(item, app, false);
            }
        }
        _ => {}
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn expand_key_files(config: &mut DeployConfig) {
    for location in [&mut config.source, &mut config.destination] {
        if let LocationConfig::Ssh(ssh) = location {
            if let Some(key) = &ssh.key_file {
                ssh.key_file = Some(expand_home(key));
            }
        }
    }
    if let Some(db) = &mut config.database {
        if let Some(key) = &db.ssh_key_file {
            db.ssh_key_file = Some(expand_home(key));
        }
    }
}

fn find_line_number(content: &str, needle: &str) -> Option<usize> {
    for (i, line) in content.lines().enumerate() {
        if line.contains(needle) {
            return Some(i + 1);
        }
    }
    None
}

fn suggest_key(unknown: &str) -> Option<String> {
    const CANDIDATES: &[&str] = &[
        "agent_name",
        "application_name",
        "description",
        "source",
        "destination",
        "type",
        "host",
        "port",
        "username",
        "password",
        "key_file",
        "passphrase",
        "path",
        "website",
        "file_mappings",
        "set_permissions_script",
        "ignore",
        "files",
        "folders",
        "extensions",
        "tenant-website",
        "assets_path",
        "generated_css_path",
        "tenants",
        "config_files_path",
        "config_files_extension",
        "database",
        "enabled",
        "ssh_host",
        "ssh_port",
        "ssh_username",
        "ssh_password",
        "ssh_key_file",
        "db_host",
        "db_port",
        "admin_username",
        "admin_password",
        "main_database_scripts",
        "tenant-database",
        "db_name",
        "db_username",
        "db_password",
        "setup_path",
        "tables_path",
        "procedures_path",
        "seeds_path",
        "seed_tables",
        "tables",
        "options",
        "dry_run",
        "verbose",
        "ignore_cache",
        "clean_install",
        "delete_extra_files",
        "max_concurrent_transfers",
        "cache_only",
        "pool_threshold",
        "acquire_timeout_secs",
        "warn",
    ];

    let mut best: Option<(&str, usize)> = None;
    for candidate in CANDIDATES {
        let dist = levenshtein(unknown, candidate);
        best = match best {
            None => Some((candidate, dist)),
            Some((_, best_dist)) if dist < best_dist => Some((candidate, dist)),
            Some(current) => Some(current),
        };
    }

    match best {
        Some((candidate, dist)) if dist > 0 && dist <= 2 => Some(candidate.to_string()),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    let mut prev: Vec<usize> = (0..=b_bytes.len()).collect();
    let mut curr = vec![0usize; b_bytes.len() + 1];

    for (i, &ac) in a_bytes.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_bytes.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] =
                std::cmp::min(std::cmp::min(prev[j + 1] + 1, curr[j] + 1), prev[j] + cost);
        }
        prev.clone_from_slice(&curr);
    }

    prev[b_bytes.len()]
}
