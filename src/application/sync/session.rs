//! How transfer workers reach a location.
//!
//! Backends that accept concurrent commands are shared directly. Backends
//! that do not are either guarded by one lock (small batches) or backed by
//! a connection pool (large batches).

use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::domain::ports::Location;
use crate::infrastructure::ssh::{ConnectionPool, PoolError, PooledSession};

/// Default batch size from which serialized backends get a pool.
pub const DEFAULT_POOL_THRESHOLD: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStrategy {
    /// Every worker uses the location directly
    Direct,
    /// One shared session, one command at a time
    Serialized,
    /// Workers draw sessions from a pool
    Pooled,
}

impl SessionStrategy {
    pub fn choose(
        requires_serialization: bool,
        changed_items: usize,
        concurrency: usize,
        threshold: usize,
    ) -> Self {
        if !requires_serialization {
            SessionStrategy::Direct
        } else if concurrency > 1 && changed_items >= threshold {
            SessionStrategy::Pooled
        } else {
            SessionStrategy::Serialized
        }
    }
}

/// Where a worker gets its session for one side of a transfer.
#[derive(Clone, Copy)]
pub enum SessionSource<'a> {
    Direct(&'a dyn Location),
    Serialized {
        location: &'a dyn Location,
        lock: &'a Mutex<()>,
    },
    Pooled(&'a ConnectionPool),
}

impl<'a> SessionSource<'a> {
    /// Wait for a session. Only the pooled variant can time out.
    pub fn lease(&self, timeout: Duration) -> Result<SessionLease<'a>, PoolError> {
        match *self {
            SessionSource::Direct(location) => Ok(SessionLease::Direct(location)),
            SessionSource::Serialized { location, lock } => {
                let guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                Ok(SessionLease::Serialized(location, guard))
            }
            SessionSource::Pooled(pool) => pool.acquire(timeout).map(SessionLease::Pooled),
        }
    }

    pub fn strategy(&self) -> SessionStrategy {
        match self {
            SessionSource::Direct(_) => SessionStrategy::Direct,
            SessionSource::Serialized { .. } => SessionStrategy::Serialized,
            SessionSource::Pooled(_) => SessionStrategy::Pooled,
        }
    }
}

/// A session held by one worker; released on drop.
pub enum SessionLease<'a> {
    Direct(&'a dyn Location),
    Serialized(&'a dyn Location, MutexGuard<'a, ()>),
    Pooled(PooledSession<'a>),
}

impl<'a> Deref for SessionLease<'a> {
    type Target = dyn Location + 'a;

    fn deref(&self) -> &Self::Target {
        match self {
            SessionLease::Direct(location) => *location,
            SessionLease::Serialized(location, _) => *location,
            SessionLease::Pooled(session) => &**session,
        }
    }
}
