//! Domain Value Objects
//!
//! Immutable value types that represent domain concepts.

mod deploy_target;
mod ignore_patterns;
mod path;
mod seed;
mod stage;
mod template_vars;

pub use deploy_target::{derive_webid, DeploymentTarget, TargetRole};
pub use ignore_patterns::{IgnoreError, IgnorePatterns};
pub use path::{normalize_separators, PathError, RelativePath};
pub use seed::{SeedDatabase, SeedTableDefinition, VariableBinding};
pub use stage::StageKind;
pub use template_vars::TemplateVars;
