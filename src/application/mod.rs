//! Application Layer
//!
//! Use cases that orchestrate the deployment flow.
//! This layer:
//! - Depends on Domain layer (entities, services, ports)
//! - Coordinates between Infrastructure and Domain
//!
//! ## Use Cases
//!
//! - `DeployUseCase` - One full run: diff, transfer, database, post-steps
//! - `TransferScheduler` - Concurrent copy/update/delete phases
//! - `DatabaseOrchestrator` - Ordered SQL stages across main and tenant databases
//! - `Seeder` - JSON-driven table seeding
//!
//! ## Post-steps
//!
//! - `MappingApplier` - Single-file copies outside the synced tree
//! - `WebTenantDeployer` - Per-tenant config, assets and generated CSS

pub mod database;
pub mod deploy;
pub mod mappings;
pub mod sync;
pub mod tenants;
pub mod web_tenants;

pub use database::{DatabaseOrchestrator, DatabaseReport, SeedReport, Seeder};
pub use deploy::{DeployOptions, DeployReport, DeployUseCase};
pub use mappings::{MappingApplier, MappingReport};
pub use sync::{SessionStrategy, SyncReport, TransferScheduler};
pub use tenants::{load_tenants, TenantProfile};
pub use web_tenants::{WebTenantDeployer, WebTenantReport};
