//! Connection pool
//!
//! A fixed set of pre-connected sessions handed out through a bounded
//! channel. At most `size` sessions are ever checked out; a `PooledSession`
//! goes back to the channel when it is dropped, whatever the outcome of the
//! work done with it.

use std::fmt;
use std::ops::Deref;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, warn};

use super::PoolError;
use crate::domain::ports::{Location, SessionFactory};

pub struct ConnectionPool {
    size: usize,
    sender: Sender<Box<dyn Location>>,
    receiver: Receiver<Box<dyn Location>>,
}

impl ConnectionPool {
    /// Open `size` sessions up front.
    ///
    /// When any session fails to open, the ones already opened are
    /// disconnected and the error is returned.
    pub fn open(factory: &dyn SessionFactory, size: usize) -> Result<Self, PoolError> {
        let size = size.max(1);
        let (sender, receiver) = bounded(size);
        let mut opened: Vec<Box<dyn Location>> = Vec::with_capacity(size);

        for index in 0..size {
            match factory.open_session() {
                Ok(session) => opened.push(session),
                Err(e) => {
                    warn!("pool session {} of {} failed: {}", index + 1, size, e);
                    for session in &opened {
                        session.disconnect();
                    }
                    return Err(PoolError::Connection(e));
                }
            }
        }

        for session in opened {
            // Capacity equals the number of sessions, so this never blocks.
            if sender.send(session).is_err() {
                return Err(PoolError::Closed);
            }
        }
        debug!(size, "connection pool ready");
        Ok(Self {
            size,
            sender,
            receiver,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Sessions currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.receiver.len()
    }

    /// Check a session out, waiting at most `timeout`.
    pub fn acquire(&self, timeout: Duration) -> Result<PooledSession<'_>, PoolError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(session) => Ok(PooledSession {
                session: Some(session),
                pool: self,
            }),
            Err(RecvTimeoutError::Timeout) => Err(PoolError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(PoolError::Closed),
        }
    }

    /// Disconnect every idle session. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        while let Ok(session) = self.receiver.try_recv() {
            session.disconnect();
            closed += 1;
        }
        if closed < self.size {
            warn!(
                "closed {} of {} pooled sessions; the rest are still checked out",
                closed, self.size
            );
        }
        closed
    }

    fn release(&self, session: Box<dyn Location>) {
        if let Err(returned) = self.sender.try_send(session) {
            returned.into_inner().disconnect();
        }
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("size", &self.size)
            .field("idle", &self.idle())
            .finish()
    }
}

/// A checked-out session, returned to its pool on drop.
pub struct PooledSession<'a> {
    session: Option<Box<dyn Location>>,
    pool: &'a ConnectionPool,
}

impl Deref for PooledSession<'_> {
    type Target = dyn Location;

    fn deref(&self) -> &Self::Target {
        match &self.session {
            Some(session) => session.as_ref(),
            None => unreachable!("pooled session used after release"),
        }
    }
}

impl fmt::Debug for PooledSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.session.as_ref().map(|session| session.display_name());
        f.debug_struct("PooledSession")
            .field("session", &name)
            .finish_non_exhaustive()
    }
}

impl Drop for PooledSession<'_> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(session);
        }
    }
}
