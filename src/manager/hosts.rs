use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// The set of remote machines available for remote worker launches.
///
/// A host is either in the pool or held by exactly one in-flight launch,
/// never both. `reserve` and `release` are non-blocking and give no
/// ordering guarantee among callers; this is a resource cache, not a
/// scheduler.
#[derive(Debug, Default)]
pub struct HostPool {
    hosts: Mutex<HashSet<String>>,
}

impl HostPool {
    #[must_use]
    pub fn new<THosts>(hosts: THosts) -> Self
    where
        THosts: IntoIterator<Item = String>,
    {
        Self {
            hosts: Mutex::new(hosts.into_iter().collect()),
        }
    }

    /// Atomically remove and return an arbitrary host, or `None` when the
    /// pool is empty.
    #[must_use]
    pub fn reserve(&self) -> Option<String> {
        let mut guard = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        let host = guard.iter().next().cloned();
        if let Some(name) = host.as_deref() {
            guard.remove(name);
        }
        host
    }

    /// Insert a host back into the pool. Releasing a host that is already
    /// present means reserve/release calls are unbalanced; the release is
    /// ignored and logged rather than silently absorbed.
    pub fn release(&self, host: String) {
        let mut guard = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.contains(&host) {
            drop(guard);
            warn!("Duplicate release of host {} already in the pool", host);
            return;
        }
        guard.insert(host);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
