//! Database deployment targets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::{StageKind, TemplateVars};

/// Whether a target is the shared main database or one tenant's database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRole {
    Main,
    Tenant { webid: String },
}

/// One database to deploy: its name, script locations per stage and the
/// variables rendered into those scripts.
#[derive(Debug, Clone)]
pub struct DeploymentTarget {
    pub database_name: String,
    pub role: TargetRole,
    pub stages: BTreeMap<StageKind, PathBuf>,
    pub template_vars: TemplateVars,
}

impl DeploymentTarget {
    pub fn main(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            role: TargetRole::Main,
            stages: BTreeMap::new(),
            template_vars: TemplateVars::new(),
        }
    }

    pub fn tenant(database_name: impl Into<String>, webid: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            role: TargetRole::Tenant {
                webid: webid.into(),
            },
            stages: BTreeMap::new(),
            template_vars: TemplateVars::new(),
        }
    }

    /// Attach a script path for a stage. Missing paths are skipped.
    pub fn with_stage(mut self, kind: StageKind, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.stages.insert(kind, path);
        }
        self
    }

    pub fn with_template_vars(mut self, vars: TemplateVars) -> Self {
        self.template_vars = vars;
        self
    }

    pub fn is_tenant(&self) -> bool {
        matches!(self.role, TargetRole::Tenant { .. })
    }

    pub fn stage_path(&self, kind: StageKind) -> Option<&PathBuf> {
        self.stages.get(&kind)
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            TargetRole::Main => write!(f, "main database '{}'", self.database_name),
            TargetRole::Tenant { webid } => {
                write!(f, "tenant '{}' database '{}'", webid, self.database_name)
            }
        }
    }
}

/// Tenant identifier derived from a tenant database name.
///
/// `shop_acme` with application `shop` yields `acme`; a name without the
/// application prefix is used whole.
pub fn derive_webid(database_name: &str, application_name: Option<&str>) -> String {
    application_name
        .and_then(|app| database_name.strip_prefix(&format!("{}_", app)))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(database_name)
        .to_string()
}
