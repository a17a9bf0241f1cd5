//! Database deployment
//!
//! - `ScriptRunner` - SQL file and directory execution with watermark filter
//! - `Seeder` - JSON-driven table seeding
//! - `DatabaseOrchestrator` - ordered stages across main and tenant targets
//! - `targets` - target construction, tenant discovery and the quick-skip check

mod orchestrator;
mod scripts;
mod seeding;
mod targets;

pub use orchestrator::{DatabaseOrchestrator, DatabaseReport, TargetSummary};
pub use scripts::{collect_sql_files, normalize_line_endings, ScriptOutcome, ScriptRunner};
pub use seeding::{expected_tenant_database, SeedReport, Seeder};
pub use targets::{
    base_vars, database_files_changed, discover_tenant_databases, main_target,
    tenant_database_names, tenant_target,
};
