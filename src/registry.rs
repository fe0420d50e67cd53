use std::collections::HashSet;

use parking_lot::Mutex;

use crate::error::ProxyError;

/// Shared pool of registered backend hosts with a round-robin rotation cursor.
///
/// The host list and the cursor live behind a single mutex so that every
/// selection decision (size read, index computation, cursor advance) is one
/// critical section. Backend I/O never happens under this lock; callers get
/// cloned snapshots out and release it immediately.
pub struct HostPool {
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    /// Registration order, no duplicates. Removal deletes in place and does
    /// not reorder survivors.
    hosts: Vec<String>,
    /// Monotonically increasing; wraps only via modulo at selection time, so
    /// removing and re-adding hosts does not bias which host comes next.
    cursor: u64,
}

/// Host identity is the URL string with any trailing slash trimmed.
fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

impl HostPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                hosts: Vec::new(),
                cursor: 0,
            }),
        }
    }

    /// Add a host. Returns `false` (no-op, not an error) when it is already
    /// registered.
    pub fn register(&self, url: &str) -> bool {
        let url = normalize(url);
        let mut inner = self.inner.lock();
        if inner.hosts.iter().any(|h| *h == url) {
            return false;
        }
        inner.hosts.push(url);
        true
    }

    /// Remove a host. Returns `false` (no-op, not an error) when it was not
    /// registered.
    pub fn unregister(&self, url: &str) -> bool {
        let url = normalize(url);
        let mut inner = self.inner.lock();
        let before = inner.hosts.len();
        inner.hosts.retain(|h| *h != url);
        inner.hosts.len() != before
    }

    /// Point-in-time snapshot of the registered hosts, in registration order.
    pub fn hosts(&self) -> Vec<String> {
        self.inner.lock().hosts.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().hosts.is_empty()
    }

    /// Select the next host round-robin: index is cursor mod pool size, then
    /// the cursor advances by one.
    pub fn next(&self) -> Result<String, ProxyError> {
        let mut inner = self.inner.lock();
        if inner.hosts.is_empty() {
            return Err(ProxyError::NoHostsAvailable);
        }
        let idx = (inner.cursor % inner.hosts.len() as u64) as usize;
        inner.cursor += 1;
        Ok(inner.hosts[idx].clone())
    }

    /// First host after `last` (wrapping around once) that is not in `tried`.
    ///
    /// Used by the failover loop: scanning starts just past the most recently
    /// tried host, or at the front when that host has since been removed.
    /// Returns `None` when the pool is empty or every registered host has
    /// already been tried.
    pub fn next_untried(&self, last: &str, tried: &HashSet<String>) -> Option<String> {
        let inner = self.inner.lock();
        if inner.hosts.is_empty() {
            return None;
        }
        let len = inner.hosts.len();
        let start = inner
            .hosts
            .iter()
            .position(|h| h == last)
            .map_or(0, |i| i + 1);
        (0..len)
            .map(|offset| &inner.hosts[(start + offset) % len])
            .find(|h| !tried.contains(h.as_str()))
            .cloned()
    }
}

impl Default for HostPool {
    fn default() -> Self {
        Self::new()
    }
}
