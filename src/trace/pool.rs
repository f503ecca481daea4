use std::sync::{Mutex, PoisonError};

use tokio::net::TcpStream;

use crate::error::{AppError, AppResult, TraceError};

/// Idle connections to the one master this process talks to.
///
/// A connection is either idle in the pool or checked out by exactly one
/// in-flight job; checked-out connections are never shared.
#[derive(Debug)]
pub struct ConnectionPool {
    addr: String,
    idle: Mutex<Vec<TcpStream>>,
}

impl ConnectionPool {
    #[must_use]
    pub const fn new(addr: String) -> Self {
        Self {
            addr,
            idle: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Check out an idle connection, dialing a new one when none is idle.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::Connect`] when a new connection cannot be
    /// established.
    pub async fn checkout(&self) -> AppResult<TcpStream> {
        let existing = {
            let mut guard = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
            guard.pop()
        };
        match existing {
            Some(conn) => Ok(conn),
            None => TcpStream::connect(&self.addr).await.map_err(|err| {
                AppError::trace(TraceError::Connect {
                    addr: self.addr.clone(),
                    source: err,
                })
            }),
        }
    }

    /// Return a connection to the idle pool.
    pub fn checkin(&self, conn: TcpStream) {
        let mut guard = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        guard.push(conn);
    }

    #[must_use]
    pub fn idle_len(&self) -> usize {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
