//! Common test utilities for stagehand scenario tests.
//!
//! This module provides:
//! - `TestEnv`: Isolated source, destination and config directories
//! - Test doubles: `RecordingExecutor`, `MemoryCache`, `PlainHasher`
//! - Assertion macros: `assert_deployed!`, `assert_not_deployed!`

#![allow(dead_code)]

pub mod assertions;
pub mod doubles;
pub mod env;

pub use assertions::*;
pub use doubles::*;
pub use env::*;
