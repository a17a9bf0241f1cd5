//! Deploy Module
//!
//! The top-level run loop.
//!
//! ## Structure
//!
//! - `options` - Run settings (`DeployOptions`)
//! - `result` - What a run did (`DeployReport`)
//! - `use_case` - The run itself (`DeployUseCase`)
//!
//! ## Usage
//!
//! ```ignore
//! use stagehand::application::deploy::{DeployOptions, DeployUseCase};
//!
//! let use_case = DeployUseCase::new(&config, JsonCacheRepository::new(), &*source, &*destination, &BcryptHasher)
//!     .with_database(&mysql);
//! let report = use_case.execute(&DeployOptions::from_config(&config.options, cache_path))?;
//! ```

mod options;
mod result;
mod use_case;

pub use options::DeployOptions;
pub use result::DeployReport;
pub use use_case::DeployUseCase;
