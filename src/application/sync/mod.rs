//! File synchronization
//!
//! - `TransferScheduler` - concurrent copy, update and delete phases
//! - `SessionStrategy` / `SessionSource` - how workers reach each side
//! - `SyncReport` - per-phase outcomes

mod report;
mod scheduler;
mod session;

pub use report::{PhaseReport, SyncReport, TransferError, TransferFailure};
pub use scheduler::{TransferScheduler, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_CONCURRENCY};
pub use session::{SessionLease, SessionSource, SessionStrategy, DEFAULT_POOL_THRESHOLD};
