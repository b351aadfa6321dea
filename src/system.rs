use std::time::Duration;

use crate::config::DEFAULT_MAX_LEASE_TTL_SECS;

/// Read-only view of system-wide lease limits.
pub trait SystemView: Send + Sync {
    fn max_lease_ttl(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct StaticSystemView {
    max_lease_ttl: Duration,
}

impl StaticSystemView {
    pub fn new(max_lease_ttl: Duration) -> Self {
        Self { max_lease_ttl }
    }
}

impl Default for StaticSystemView {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_MAX_LEASE_TTL_SECS))
    }
}

impl SystemView for StaticSystemView {
    fn max_lease_ttl(&self) -> Duration {
        self.max_lease_ttl
    }
}
