//! Command implementations for the stagehand binary.

pub mod confirm;
pub mod deploy;
