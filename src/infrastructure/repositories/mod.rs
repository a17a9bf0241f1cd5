//! Repository Implementations
//!
//! Concrete implementations of domain repository ports.

mod cache;

pub use cache::{CacheLock, JsonCacheRepository};
